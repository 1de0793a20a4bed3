// src/render.rs
//! Front-stage HTML. Every function here is pure: document in, markup out.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt::Write as _;

use crate::core::config_manager::MirrorConfig;
use crate::types::{Credential, CredentialKind, ExperienceKind, Profile, Project, ResumeDocument, SkillGroup};

const PLACEHOLDER_AVATAR_SVG: &str = "<svg xmlns='http://www.w3.org/2000/svg' width='240' height='240'><rect width='100%' height='100%' fill='#0a0d18'/><circle cx='120' cy='90' r='50' fill='#2470a0'/><rect x='60' y='150' width='120' height='50' rx='25' fill='#a696c8'/></svg>";

const METER_CELLS: usize = 5;

/// How image references are turned into URLs
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub mirror: MirrorConfig,
    /// Appended as `?t=` to CDN image URLs
    pub cache_bust: Option<i64>,
}

impl RenderContext {
    pub fn new(mirror: MirrorConfig) -> Self {
        Self {
            mirror,
            cache_bust: None,
        }
    }

    pub fn with_cache_bust(mut self, timestamp: i64) -> Self {
        self.cache_bust = Some(timestamp);
        self
    }

    /// Repository paths become CDN URLs; CDN URLs get the cache-busting suffix
    pub fn resolve_image(&self, reference: &str) -> String {
        let url = if self.mirror.is_repo_asset(reference) {
            self.mirror.cdn_url(reference)
        } else {
            reference.to_string()
        };

        match self.cache_bust {
            Some(ts) if self.mirror.is_cdn_url(&url) => format!("{}?t={}", url, ts),
            _ => url,
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escaped text with newlines as `<br>`
pub fn format_line_breaks(text: &str) -> String {
    escape_html(text).replace("\r\n", "\n").replace('\n', "<br>")
}

/// Number of filled meter cells for a proficiency label
pub fn level_score(level: &str) -> usize {
    match level.trim() {
        "" => 0,
        "剛接觸" | "Novice" => 1,
        "入門" | "Beginner" => 2,
        "進階" | "Advanced" => 4,
        "熟練" | "Proficient" => 5,
        _ => 3,
    }
}

pub fn level_meter(score: usize) -> String {
    let cells: String = (0..METER_CELLS)
        .map(|i| {
            if i < score {
                r#"<span class="level-cell filled"></span>"#
            } else {
                r#"<span class="level-cell"></span>"#
            }
        })
        .collect();
    format!(r#"<span class="level-meter">{}</span>"#, cells)
}

/// `avatarPath`, then the legacy inline image, then a placeholder
pub fn avatar_src(profile: &Profile, ctx: &RenderContext) -> String {
    if let Some(path) = profile.avatar_path.as_deref().filter(|p| !p.is_empty()) {
        return ctx.resolve_image(path);
    }
    if let Some(inline) = profile.avatar_base64.as_deref().filter(|p| !p.is_empty()) {
        return inline.to_string();
    }
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(PLACEHOLDER_AVATAR_SVG))
}

fn links_html(profile: &Profile) -> String {
    profile
        .links
        .iter()
        .map(|link| {
            format!(
                r#"<a href="{}" target="_blank"><i class="{}"></i> {}</a>"#,
                escape_html(&link.href),
                escape_html(&link.icon),
                escape_html(&link.label)
            )
        })
        .collect()
}

pub fn render_profile(profile: &Profile, ctx: &RenderContext) -> String {
    let meta: String = [&profile.location, &profile.email, &profile.phone]
        .into_iter()
        .filter(|v| !v.is_empty())
        .map(|v| format!(r#"<span class="badge">{}</span>"#, escape_html(v)))
        .collect();

    let about = if profile.about_description.is_empty() {
        &profile.hero_description
    } else {
        &profile.about_description
    };

    format!(
        r#"<section id="hero">
<img id="hero-avatar" src="{avatar}" alt="{name}">
<h1 id="hero-name">{name}</h1>
<p id="hero-title">{title}</p>
<p id="hero-intro">{intro}</p>
<div id="hero-meta">{meta}</div>
</section>
<section id="about"><div id="about-content">
<h3>{title}</h3>
<p>{about}</p>
<div class="links">{links}</div>
</div></section>
"#,
        avatar = escape_html(&avatar_src(profile, ctx)),
        name = escape_html(&profile.name),
        title = escape_html(&profile.title),
        intro = format_line_breaks(&profile.hero_description),
        meta = meta,
        about = format_line_breaks(about),
        links = links_html(profile),
    )
}

pub fn render_skills(skills: &[SkillGroup]) -> String {
    let mut html = String::from(r#"<section id="skills"><div id="skills-grid">"#);

    for group in skills {
        let _ = write!(html, r#"<div class="card skill-card"><h3>{}</h3><ul>"#, escape_html(&group.name));
        for item in &group.items {
            let badge = if item.level.is_empty() {
                r#"<span class="badge badge-empty"></span>"#.to_string()
            } else {
                format!(r#"<span class="badge">{}</span>"#, escape_html(&item.level))
            };
            let _ = write!(
                html,
                r#"<li class="skill-item"><span class="skill-name">{}</span>{}{}</li>"#,
                escape_html(&item.name),
                badge,
                level_meter(level_score(&item.level))
            );
        }
        html.push_str("</ul></div>");
    }

    html.push_str("</div></section>\n");
    html
}

fn timeline(doc: &ResumeDocument, kind: &ExperienceKind, target_id: &str, badge: &str) -> String {
    let mut html = format!(r#"<div id="{}" class="timeline">"#, target_id);

    for (idx, item) in doc.experience_of(kind).enumerate() {
        let _ = write!(
            html,
            r#"<div class="timeline-item" style="--y-offset: {}px"><div class="badge">{}</div><h3>{} - {}</h3><p class="text-muted">{}</p><p>{}</p><span class="connector"></span></div>"#,
            idx * 24,
            badge,
            escape_html(&item.company),
            escape_html(&item.role),
            escape_html(&item.period),
            format_line_breaks(&item.summary)
        );
    }

    html.push_str("</div>");
    html
}

/// Work and education timelines. Entries of any other kind are kept in the document but not shown.
pub fn render_experience(doc: &ResumeDocument) -> String {
    format!(
        "<section id=\"experience\">{}{}</section>\n",
        timeline(doc, &ExperienceKind::Work, "work-timeline", "Work"),
        timeline(doc, &ExperienceKind::Education, "education-timeline", "Education")
    )
}

fn credential_card(item: &Credential, badge: &str, ctx: &RenderContext) -> String {
    let photo = item
        .photo_path
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| ctx.resolve_image(p))
        .or_else(|| item.photo_base64.clone().filter(|p| !p.is_empty()));

    let mut meta = escape_html(&item.issuer);
    if !item.year.is_empty() {
        let _ = write!(meta, " · {}", escape_html(&item.year));
    }

    let link = if item.link.is_empty() {
        String::new()
    } else {
        format!(r#"<a href="{}" target="_blank">View</a>"#, escape_html(&item.link))
    };

    match photo {
        Some(src) => format!(
            r#"<div class="card award-card-with-photo"><div class="badge">{}</div><img src="{}" class="award-photo"><h3>{}</h3><p class="text-muted">{}</p><p>{}</p>{}</div>"#,
            badge,
            escape_html(&src),
            escape_html(&item.name),
            meta,
            format_line_breaks(&item.desc),
            link
        ),
        None => format!(
            r#"<div class="card"><div class="badge">{}</div><h3>{}</h3><p class="text-muted">{}</p><p>{}</p>{}</div>"#,
            badge,
            escape_html(&item.name),
            meta,
            format_line_breaks(&item.desc),
            link
        ),
    }
}

pub fn render_credentials(doc: &ResumeDocument, kind: CredentialKind, ctx: &RenderContext) -> String {
    let cards: String = doc
        .credentials(kind)
        .iter()
        .map(|item| credential_card(item, kind.badge(), ctx))
        .collect();
    format!(r#"<div id="{}" class="grid">{}</div>"#, kind.grid_id(), cards)
}

fn project_card(item: &Project) -> String {
    let tags: String = item
        .tags()
        .map(|tag| format!("<span>{}</span>", escape_html(tag)))
        .collect();
    let link = if item.link.is_empty() {
        String::new()
    } else {
        format!(r#"<a class="btn ghost" href="{}" target="_blank">Open</a>"#, escape_html(&item.link))
    };

    format!(
        r#"<div class="card project"><h3>{}</h3><p>{}</p><div class="tags">{}</div>{}</div>"#,
        escape_html(&item.name),
        format_line_breaks(&item.desc),
        tags,
        link
    )
}

pub fn render_projects(projects: &[Project]) -> String {
    let cards: String = projects.iter().map(project_card).collect();
    format!("<section id=\"projects\"><div id=\"projects-grid\">{}</div></section>\n", cards)
}

pub fn render_contact(profile: &Profile) -> String {
    format!(
        r#"<section id="contact"><div id="contact-card"><div class="card">
<p><i class="fa-solid fa-location-dot"></i> {}</p>
<p><i class="fa-solid fa-envelope"></i> {}</p>
<p><i class="fa-solid fa-phone"></i> {}</p>
<div class="links">{}</div>
</div></div></section>
"#,
        escape_html(&profile.location),
        escape_html(&profile.email),
        escape_html(&profile.phone),
        links_html(profile)
    )
}

/// Full front-stage page
pub fn render_page(doc: &ResumeDocument, ctx: &RenderContext) -> String {
    let credentials: String = CredentialKind::ALL
        .iter()
        .map(|kind| render_credentials(doc, *kind, ctx))
        .collect();

    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(&doc.profile.name));
    html.push_str("</head>\n<body>\n");
    html.push_str(&render_profile(&doc.profile, ctx));
    html.push_str(&render_skills(&doc.skills));
    html.push_str(&render_experience(doc));
    let _ = writeln!(html, "<section id=\"achievements\">{}</section>", credentials);
    html.push_str(&render_projects(&doc.projects));
    html.push_str(&render_contact(&doc.profile));
    let _ = writeln!(html, "<footer id=\"footer-name\">{}</footer>", escape_html(&doc.profile.name));
    html.push_str("</body>\n</html>\n");
    html
}
