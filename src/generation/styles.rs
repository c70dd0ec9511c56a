use std::path::{Path, PathBuf};

/// Style used whenever a request names a style the catalog does not know.
pub const DEFAULT_STYLE: &str = "scandinavian";

/// Reference images live under `<base_dir>/static/images`.
pub const REFERENCE_IMAGE_DIR: [&str; 2] = ["static", "images"];

const BASE_PROMPT: &str = "Based on the provided floor plan image, create a realistic top-down 3D interior render of the same apartment. \
Completely erase and reconstruct any text, numbers, or symbols from the input — no visible letters, digits, or words must remain. \
Redraw those regions with appropriate wall/floor textures, not empty spaces. \
Keep the exact layout and proportions from the blueprint — do not alter the architecture. ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub reference_image: Option<&'static str>,
}

const STYLES: [StyleDescriptor; 6] = [
    StyleDescriptor {
        id: "minimalism",
        label: "Minimalism",
        description: "Minimalist interior design with clean lines, neutral color palette (whites, grays, beiges), \
minimal furniture, open spaces, natural light, simple geometric shapes, \
uncluttered surfaces, monochromatic scheme, high-quality materials like marble and wood.",
        reference_image: Some("example_interior.png"),
    },
    StyleDescriptor {
        id: "modern",
        label: "Modern",
        description: "Modern contemporary interior with sleek furniture, bold colors mixed with neutrals, \
metallic accents (chrome, gold), geometric patterns, statement lighting fixtures, \
glass and metal materials, vibrant artwork, mixed textures, urban sophistication.",
        reference_image: Some("modern.png"),
    },
    StyleDescriptor {
        id: "gothic",
        label: "Gothic",
        description: "Gothic interior design with dark colors (deep purples, blacks, burgundy), \
ornate furniture with intricate details, dramatic lighting, velvet and brocade fabrics, \
arched windows, antique elements, rich textures, medieval-inspired decor, \
candles and chandeliers, luxurious and mysterious atmosphere.",
        reference_image: Some("gothic.png"),
    },
    StyleDescriptor {
        id: "shabby_chic",
        label: "Shabby chic",
        description: "Shabby chic interior with vintage furniture, distressed wood finishes, pastel colors \
(soft pinks, mint greens, lavender), floral patterns, whitewashed walls, \
rustic elements, antique accessories, lace and cotton fabrics, \
romantic and cozy atmosphere with worn elegance.",
        reference_image: Some("shabby-chic.png"),
    },
    StyleDescriptor {
        id: "japanese",
        label: "Japanese",
        description: "Japanese interior design with tatami mats, sliding shoji screens, natural wood materials, \
neutral color palette (browns, beiges, whites), minimal furniture, low seating, \
zen garden elements, bamboo accents, paper lanterns, natural lighting, \
serene and peaceful atmosphere with emphasis on harmony and simplicity.",
        reference_image: Some("japanese.png"),
    },
    StyleDescriptor {
        id: "scandinavian",
        label: "Scandinavian",
        description: "Scandinavian interior design with light wood flooring, white and pastel walls, \
cozy textiles (wool, linen), natural materials, hygge elements, simple furniture, \
warm lighting, plants, neutral color palette with pops of color, \
functional and comfortable design with emphasis on coziness and natural light.",
        reference_image: Some("scandinavian.png"),
    },
];

/// Fixed catalog of decorating styles.
pub struct StyleCatalog;

impl StyleCatalog {
    pub fn all() -> &'static [StyleDescriptor] {
        &STYLES
    }

    pub fn get(style_id: &str) -> Option<&'static StyleDescriptor> {
        STYLES.iter().find(|style| style.id == style_id)
    }

    pub fn default_style() -> &'static StyleDescriptor {
        // DEFAULT_STYLE is one of the STYLES entries.
        Self::get(DEFAULT_STYLE).unwrap_or(&STYLES[STYLES.len() - 1])
    }

    /// Looks up a style, falling back to [`DEFAULT_STYLE`] for unknown ids.
    pub fn resolve(style_id: &str) -> &'static StyleDescriptor {
        match Self::get(style_id) {
            Some(style) => style,
            None => {
                log::warn!(
                    "Unknown style '{}', falling back to '{}'",
                    style_id,
                    DEFAULT_STYLE
                );
                Self::default_style()
            }
        }
    }

    /// Base instruction plus the style fragment.
    pub fn style_prompt(style_id: &str) -> String {
        let style = Self::resolve(style_id);
        format!("{}Interior style: {}", BASE_PROMPT, style.description)
    }

    pub fn resolve_prompt(style_id: &str, user_text: &str) -> String {
        let style_prompt = Self::style_prompt(style_id);
        let user_text = user_text.trim();
        if user_text.is_empty() {
            style_prompt
        } else {
            format!("{}\nAdditional requirements: {}", style_prompt, user_text)
        }
    }

    /// Path of the style's reference image, if the file exists right now.
    ///
    /// Unknown style ids have no reference image; the default-style fallback
    /// only applies to prompt text.
    pub fn resolve_reference_image(style_id: &str, base_dir: &Path) -> Option<PathBuf> {
        let file_name = Self::get(style_id)?.reference_image?;
        let path = REFERENCE_IMAGE_DIR
            .iter()
            .fold(base_dir.to_path_buf(), |dir, part| dir.join(part))
            .join(file_name);

        if path.is_file() {
            Some(path)
        } else {
            log::debug!(
                "Reference image for style '{}' not found at {}",
                style_id,
                path.display()
            );
            None
        }
    }
}
