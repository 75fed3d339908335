//! Placeholder panes for the two read-only external pages.
//!
//! The browser original embeds these as iframes; a terminal cannot, so the
//! panes surface the fixed URL for the operator to open. No data flows
//! between them and the rest of the app.

#[derive(Debug, Clone, Copy)]
pub struct EmbedPane {
    pub title: &'static str,
    pub url: &'static str,
    pub blurb: &'static str,
}

pub const SHOWCASE_EMBED: EmbedPane = EmbedPane {
    title: "Models Showcase",
    url: "https://usageflows.info/models-showcase",
    blurb: "Curated model comparisons with strengths, limitations and pricing.",
};

pub const MODELS_EMBED: EmbedPane = EmbedPane {
    title: "Models",
    url: "https://usageflows.info/models",
    blurb: "The gateway's full model directory.",
};
