use super::ProjectRecord;

fn record(id: i64, title: &str, description: &str, image: &str, tags: &[&str]) -> ProjectRecord {
    ProjectRecord {
        id,
        title: title.to_string(),
        description: description.to_string(),
        image: Some(image.to_string()),
        video: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        live_url: Some("https://example.com".to_string()),
        behance_url: Some("https://behance.net".to_string()),
    }
}

/// Built-in project list served before anything has been saved.
pub fn builtin_projects() -> Vec<ProjectRecord> {
    vec![
        record(
            1,
            "Brand Identity Design",
            "Logo, color system, typography and brand guidelines for a startup.",
            "https://images.unsplash.com/photo-1561070791-2526d30994b5?w=800&h=600&fit=crop",
            &["Branding", "Logo Design", "CI/BI", "Adobe Illustrator"],
        ),
        record(
            2,
            "Mobile App UI/UX",
            "Fintech app design from user research through to prototype.",
            "https://images.unsplash.com/photo-1512941937669-90a1b58e7e9c?w=800&h=600&fit=crop",
            &["UI/UX", "Figma", "Prototyping", "User Research"],
        ),
        record(
            3,
            "Website Redesign",
            "Corporate site redesign with a modern design system and responsive layout.",
            "https://images.unsplash.com/photo-1467232004584-a241de8bcf5d?w=800&h=600&fit=crop",
            &["Web Design", "Responsive", "Figma", "Webflow"],
        ),
        record(
            4,
            "Package Design",
            "Packaging for a premium cosmetics brand.",
            "https://images.unsplash.com/photo-1586495777744-4413f21062fa?w=800&h=600&fit=crop",
            &["Package Design", "Print", "Adobe Photoshop", "3D Mockup"],
        ),
    ]
}
