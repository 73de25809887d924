//! Static content page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::filters;
use crate::middleware::PageContext;

/// A question and its answer.
#[derive(Debug, Clone, Copy)]
pub struct Faq {
    pub question: &'static str,
    pub answer: &'static str,
}

/// Frequently asked questions, in display order.
pub const FAQS: &[Faq] = &[
    Faq {
        question: "How to Order?",
        answer: "Visit our shop page to browse our collection. Add your desired products to the cart. \
                 Once you're ready, proceed to the cart page where you can review your order. You can \
                 either fill out the contact form or send us your order details via WhatsApp. We'll \
                 guide you through the rest of the process!",
    },
    Faq {
        question: "Shopping Procedure",
        answer: "After receiving your order through our contact form or WhatsApp, we'll review it and \
                 get in touch with you to confirm the details. Please ensure all contact information \
                 is filled out correctly to avoid any delays. We'll then guide you through the payment \
                 process and shipping arrangements.",
    },
    Faq {
        question: "What is the point of KAWS?",
        answer: "KAWS, a former graffiti artist and skateboarder, represents accessible popular art for \
                 everyone. His work primarily draws inspiration from iconic figures in cinema and \
                 television, transforming them to reflect on contemporary society. Each piece serves \
                 as a commentary on modern culture while maintaining a distinctive artistic style.",
    },
    Faq {
        question: "Are KAWS figures worth collecting?",
        answer: "Yes! KAWS figures are highly collectible items that often appreciate in value over \
                 time. They represent a unique intersection of street art, pop culture, and \
                 contemporary art, making them valuable both as art pieces and investments.",
    },
];

/// FAQ page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/faqs.html")]
pub struct FaqsTemplate {
    pub page: PageContext,
    pub faqs: Vec<Faq>,
}

/// Display the FAQ page.
#[instrument(skip(page))]
pub async fn faqs(page: PageContext) -> impl IntoResponse {
    FaqsTemplate {
        page,
        faqs: FAQS.to_vec(),
    }
}
