//! Certificate image URL construction.
//!
//! The certificate is never rendered locally: we build a Cloudinary
//! delivery URL whose transformation chain overlays the respondent's
//! name, archetype, and completion date on a base template. Building the
//! URL is pure string work, so the renderer seam is synchronous.

use chrono::{DateTime, Utc};

use crate::catalog::Archetype;
use crate::error::EnrichError;

const CERT_WIDTH: u32 = 1200;
const CERT_HEIGHT: u32 = 630;
const HEADLINE_MAX: usize = 80;

/// Produces a shareable certificate image URL for a completed session.
pub trait CertificateRenderer: Send + Sync {
    fn render_url(
        &self,
        name: &str,
        archetype: &Archetype,
        completed_at: DateTime<Utc>,
    ) -> Result<String, EnrichError>;
}

/// Percent-encode a text overlay segment. Commas and slashes delimit
/// Cloudinary transformation components, so they must be double-encoded
/// to survive the CDN's own URL parsing.
fn encode_overlay(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b',' => out.push_str("%252C"),
            b'/' => out.push_str("%252F"),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Truncate overlay copy that would overflow the template.
fn clip_headline(headline: &str) -> String {
    if headline.chars().count() <= HEADLINE_MAX {
        return headline.to_string();
    }
    let clipped: String = headline.chars().take(HEADLINE_MAX - 3).collect();
    format!("{}...", clipped.trim_end())
}

// ── Cloudinary renderer ─────────────────────────────────────────────

pub struct CloudinaryRenderer {
    cloud_name: String,
    template_id: String,
}

impl CloudinaryRenderer {
    pub fn new(cloud_name: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            template_id: "nufounders/certificate_base".to_string(),
        }
    }
}

impl CertificateRenderer for CloudinaryRenderer {
    fn render_url(
        &self,
        name: &str,
        archetype: &Archetype,
        completed_at: DateTime<Utc>,
    ) -> Result<String, EnrichError> {
        if self.cloud_name.trim().is_empty() {
            return Err(EnrichError::RendererUnavailable(
                "cloudinary cloud name is empty".to_string(),
            ));
        }

        let display_name = if name.trim().is_empty() {
            "NuFounder"
        } else {
            name.trim()
        };
        let headline = clip_headline(archetype.headline);
        let date = completed_at.format("%B %-d, %Y").to_string();

        let transforms = [
            format!("w_{CERT_WIDTH},h_{CERT_HEIGHT},c_fill"),
            format!(
                "l_text:Montserrat_56_bold:{},co_rgb:1A1A2E,g_north,y_210/fl_layer_apply",
                encode_overlay(display_name)
            ),
            format!(
                "l_text:Montserrat_34_bold:{}%20{},co_rgb:6C3FC5,g_center,y_20/fl_layer_apply",
                encode_overlay(archetype.emoji),
                encode_overlay(archetype.name)
            ),
            format!(
                "l_text:Montserrat_22:{},co_rgb:44445A,g_center,y_90/fl_layer_apply",
                encode_overlay(&headline)
            ),
            format!(
                "l_text:Montserrat_20:{},co_rgb:8888A0,g_south,y_60/fl_layer_apply",
                encode_overlay(&date)
            ),
        ]
        .join("/");

        Ok(format!(
            "https://res.cloudinary.com/{}/image/upload/{}/{}.png",
            self.cloud_name, transforms, self.template_id
        ))
    }
}
