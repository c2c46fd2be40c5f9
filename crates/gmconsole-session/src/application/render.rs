//! Turns the session state and the last outcome into the HTML fragment
//! pushed to spectators.

use std::fmt::Write as _;

use crate::domain::character::Character;
use crate::domain::world::World;

use super::interpreter::Outcome;

/// Escapes text for inclusion in HTML content or a quoted attribute.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Renders the payload for `outcome`, or `None` when spectators should not
/// be sent anything.
#[must_use]
pub fn render(world: &World, outcome: &Outcome) -> Option<String> {
    if !outcome.is_visible() {
        return None;
    }
    let mut html = String::new();
    if world.view.no_text {
        place_image(world, &mut html);
        return Some(html);
    }
    match outcome {
        Outcome::Overlay(text) => {
            let _ = write!(html, "<div class=\"overlay\"><pre>{}</pre></div>", escape_html(text));
        }
        Outcome::Battle {
            narration,
            attacker,
            target,
        } => battle(world, narration, attacker, target, &mut html),
        Outcome::Message(text) => scene_view(world, text, &mut html),
        Outcome::StartAutoFight => scene_view(world, "Auto-fight engaged.", &mut html),
        Outcome::Refresh | Outcome::Unchanged | Outcome::Listing(_) => scene_view(world, "", &mut html),
    }
    Some(html)
}

fn place_image(world: &World, html: &mut String) {
    let place = world
        .content
        .place(&world.place)
        .filter(|p| !p.image.is_empty());
    if let Some(place) = place {
        let _ = write!(
            html,
            "<div class=\"place\"><img src=\"{}\" alt=\"{}\"></div>",
            escape_html(&place.image),
            escape_html(&place.name)
        );
    }
}

fn battle(world: &World, narration: &str, attacker: &str, target: &str, html: &mut String) {
    html.push_str("<div class=\"battle\">");
    if let Some(c) = world.roster.get(attacker) {
        card(world, c, None, html);
    }
    let _ = write!(html, "<pre class=\"narration\">{}</pre>", escape_html(narration));
    if let Some(c) = world.roster.get(target) {
        card(world, c, None, html);
    }
    html.push_str("</div>");
}

fn scene_view(world: &World, message: &str, html: &mut String) {
    let place = world.content.place(&world.place);
    let title = place.map_or(world.place.as_str(), |p| p.name.as_str());
    let _ = write!(html, "<h1>{}</h1>", escape_html(title));
    place_image(world, html);
    if let Some(place) = place.filter(|p| !p.desc.is_empty()) {
        let _ = write!(html, "<p class=\"desc\">{}</p>", escape_html(&place.desc));
    }

    if let Some(scene) = world.scene.as_deref().and_then(|k| world.content.scene(k)) {
        let _ = write!(html, "<p class=\"scene\">{}</p>", escape_html(&scene.desc));
        let objects: Vec<String> = scene
            .objects
            .iter()
            .filter_map(|p| {
                world.content.object(&p.object).map(|o| {
                    format!("<li>{}{}</li>", escape_html(&o.name), escape_html(&p.context))
                })
            })
            .collect();
        if !objects.is_empty() {
            let _ = write!(html, "<ul class=\"objects\">{}</ul>", objects.concat());
        }
    }

    if world.turns.is_active() {
        html.push_str("<ol class=\"initiative\">");
        for (i, entry) in world.turns.entries().iter().enumerate() {
            let class = if i + 1 == world.turns.current_index() {
                " class=\"current\""
            } else {
                ""
            };
            let _ = write!(html, "<li{class}>{}</li>", escape_html(&entry.to_string()));
        }
        html.push_str("</ol>");
    }

    if !message.is_empty() {
        let _ = write!(html, "<p class=\"msg\">{}</p>", escape_html(message));
    }

    // Attack links are offered on NPC cards while a party member holds the turn.
    let acting = world.turn_occupant().filter(|c| c.is_party());
    if world.view.show_npcs {
        html.push_str("<div class=\"npcs\">");
        for c in world.roster.npcs() {
            card(world, c, acting, html);
        }
        html.push_str("</div>");
    }
    if world.view.show_party {
        html.push_str("<div class=\"party\">");
        for c in world.roster.party() {
            card(world, c, None, html);
        }
        html.push_str("</div>");
    }
}

fn card(world: &World, c: &Character, acting: Option<&Character>, html: &mut String) {
    let colour = c.wound().colour();
    let style = if colour.is_empty() {
        String::new()
    } else {
        format!(" style=\"border-color:{colour}\"")
    };
    let down = if c.is_alive() { "" } else { " down" };
    let _ = write!(html, "<div class=\"card{down}\"{style}>");
    if world.view.show_mugs && !c.sheet.image.is_empty() {
        let _ = write!(
            html,
            "<img src=\"{}\" alt=\"{}\">",
            escape_html(&c.sheet.image),
            escape_html(c.name())
        );
    }
    let _ = write!(
        html,
        "<b>{}</b> <span class=\"hp\">{}/{}</span> <span class=\"ac\">AC {}</span>",
        escape_html(c.name()),
        c.cur_hp,
        c.sheet.hp,
        c.sheet.ac
    );
    if let Some(attacker) = acting.filter(|_| c.is_alive()) {
        for (i, a) in attacker.sheet.attacks.iter().enumerate() {
            let _ = write!(
                html,
                " <a href=\"/attack?char={}&amp;target={}&amp;attack={i}\">{}</a>",
                escape_html(&attacker.key),
                escape_html(&c.key),
                escape_html(&a.name)
            );
        }
    }
    html.push_str("</div>");
}
