use super::models::{Currency, SaleCategory};
use crate::errors::ApiResult;
use crate::media::MediaAsset;
use crate::validation::payload::{Payload, Violations, link_field, order_field};

#[derive(Clone, Debug, Default)]
pub struct SaleProjectPatch {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    pub category: Option<SaleCategory>,
    pub technologies: Option<Vec<String>>,
    pub duration: Option<String>,
    pub implementation_guide: Option<String>,
    pub features: Option<Vec<String>>,
    pub includes: Option<Vec<String>>,
    pub demo_url: Option<Option<String>>,
    pub github_url: Option<Option<String>>,
    pub contact_url: Option<Option<String>>,
    pub thumbnail: Option<MediaAsset>,
    pub is_visible: Option<bool>,
    pub is_featured: Option<bool>,
    pub order: Option<i64>,
}

impl SaleProjectPatch {
    /// `technologies` is a comma list; `features` and `includes` are one
    /// entry per line since entries often contain commas.
    pub fn from_payload(payload: &Payload) -> ApiResult<Self> {
        let mut violations = Violations::new();

        let title = payload.text("title");
        if let Some(title) = &title {
            violations.length("title", title, 1, 120, "Title must be between 1 and 120 characters");
        }
        let short_description = payload.text("shortDescription");
        if let Some(text) = &short_description {
            violations.length(
                "shortDescription",
                text,
                1,
                300,
                "Short description cannot exceed 300 characters",
            );
        }
        let description = payload.text("description");
        if let Some(text) = &description {
            violations.length(
                "description",
                text,
                1,
                5000,
                "Description cannot exceed 5000 characters",
            );
        }

        let price = violations.take(
            "price",
            payload.number("price"),
            "Price must be a valid number >= 0",
        );
        if price.is_some_and(|price| price < 0.0) {
            violations.add("price", "Price must be a valid number >= 0");
        }

        let thumbnail = violations.take(
            "thumbnail",
            payload.json::<MediaAsset>("thumbnail"),
            "Thumbnail must be an object with a url",
        );

        let patch = SaleProjectPatch {
            title,
            short_description,
            description,
            price,
            currency: violations.take("currency", payload.choice("currency"), "Invalid currency"),
            category: violations.take("category", payload.choice("category"), "Invalid category"),
            technologies: payload.csv_list("technologies"),
            duration: payload.text("duration"),
            implementation_guide: payload.text("implementationGuide"),
            features: payload.line_list("features"),
            includes: payload.line_list("includes"),
            demo_url: link_field(&mut violations, payload, "demoUrl", "Invalid demo URL"),
            github_url: link_field(&mut violations, payload, "githubUrl", "Invalid GitHub URL"),
            contact_url: link_field(&mut violations, payload, "contactUrl", "Invalid contact URL"),
            thumbnail: thumbnail.filter(|thumbnail| !thumbnail.url.trim().is_empty()),
            is_visible: violations.take(
                "isVisible",
                payload.flag("isVisible"),
                "Visibility must be a boolean",
            ),
            is_featured: violations.take(
                "isFeatured",
                payload.flag("isFeatured"),
                "Featured must be a boolean",
            ),
            order: order_field(&mut violations, payload),
        };

        violations.finish()?;
        Ok(patch)
    }

    pub fn check_required(&self) -> ApiResult<()> {
        let mut violations = Violations::new();
        violations.check(self.title.is_some(), "title", "Title is required");
        violations.check(
            self.short_description.is_some(),
            "shortDescription",
            "Short description is required",
        );
        violations.check(self.description.is_some(), "description", "Description is required");
        violations.check(self.price.is_some(), "price", "Price is required");
        violations.finish()
    }
}
