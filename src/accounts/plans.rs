use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub slug: &'static str,
    pub name: &'static str,
    pub price: &'static str,
    pub description: &'static str,
}

pub const PLANS: [Plan; 5] = [
    Plan {
        slug: "basic",
        name: "Basic Set",
        price: "25$",
        description: "2D / 3D",
    },
    Plan {
        slug: "plus",
        name: "Plus Set",
        price: "45$",
        description: "2D / 3D / Tour / High Quality",
    },
    Plan {
        slug: "render",
        name: "Render Set",
        price: "49$",
        description: "2D / 3D / Tour / High Quality / Visualizations",
    },
    Plan {
        slug: "max",
        name: "Max Set",
        price: "69$",
        description: "Full package + Branding",
    },
    Plan {
        slug: "pro",
        name: "Pro Set",
        price: "49$",
        description: "2D / 3D / Tour / Branding",
    },
];

/// Case-insensitive lookup; blank slugs match nothing.
pub fn plan_by_slug(slug: &str) -> Option<&'static Plan> {
    let slug = slug.trim();
    if slug.is_empty() {
        return None;
    }
    PLANS
        .iter()
        .find(|plan| plan.slug.eq_ignore_ascii_case(slug))
}
