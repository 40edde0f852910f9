//! Static page rendering
//!
//! Every page is a fixed template rendered without request parameters; the
//! context only carries the page slug so the layout can highlight navigation.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tera::{Context, Tera};

use crate::handler::router::RequestContext;
use crate::http;
use crate::logger;

/// The pages the site knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Collections,
    About,
    Contact,
    ThankYou,
    Impacts,
    Sustainability,
    Community,
    Other,
}

impl Page {
    pub const ALL: [Self; 9] = [
        Self::Home,
        Self::Collections,
        Self::About,
        Self::Contact,
        Self::ThankYou,
        Self::Impacts,
        Self::Sustainability,
        Self::Community,
        Self::Other,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Collections => "/collections",
            Self::About => "/about",
            Self::Contact => "/contact",
            Self::ThankYou => "/thank-you",
            Self::Impacts => "/impacts",
            Self::Sustainability => "/sustainability",
            Self::Community => "/community",
            Self::Other => "/other",
        }
    }

    /// Short name used for the template file and navigation state
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Home => "index",
            Self::Collections => "collections",
            Self::About => "about",
            Self::Contact => "contact",
            Self::ThankYou => "thank-you",
            Self::Impacts => "impacts",
            Self::Sustainability => "sustainability",
            Self::Community => "community",
            Self::Other => "other",
        }
    }

    pub fn template(self) -> String {
        format!("{}.html", self.slug())
    }

    /// Exact match, tolerating a single trailing slash (`/about/`)
    pub fn from_path(path: &str) -> Option<Self> {
        let path = match path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };
        Self::ALL.into_iter().find(|page| page.path() == path)
    }
}

/// Render `page`; template problems become a logged 500
pub fn render_page(
    ctx: &RequestContext<'_>,
    page: Page,
    templates: Option<&Tera>,
) -> Response<Full<Bytes>> {
    let Some(tera) = templates else {
        logger::log_error(&format!("No templates loaded, cannot render {}", ctx.path));
        return http::build_500_response(ctx.is_head);
    };

    let mut context = Context::new();
    context.insert("page", page.slug());

    match tera.render(&page.template(), &context) {
        Ok(html) => http::build_html_response(html, ctx.is_head),
        Err(e) => {
            logger::log_error(&format!("Failed to render {}: {e:?}", page.template()));
            http::build_500_response(ctx.is_head)
        }
    }
}
