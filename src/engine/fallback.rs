//! Offline fallback responder
//!
//! When the backend is unreachable and the conversation is still in
//! automated mode, the widget answers locally with a canned response
//! routed by keyword. The widget engine guarantees this is never invoked
//! while a human agent is involved (`agent` or `waiting` mode); an agent
//! conversation must never silently receive a canned bot answer.

/// Keyword categories, checked in priority order
///
/// The first category with a matching keyword wins; the last entry is the
/// catch-all used when nothing matches.
const CATEGORIES: &[(&[&str], &str)] = &[
    (
        &["live agent", "talk to agent", "customer service", "human", "real person"],
        "All of our agents need an active connection to join. You appear to be offline \
         right now; please try again once your connection is back.",
    ),
    (
        &["track", "tracking", "where is my", "shipment status"],
        "You can track any shipment from the Tracking page using your tracking number. \
         Live tracking updates will resume once you are back online.",
    ),
    (
        &["ship", "shipping", "delivery", "deliver", "package", "parcel"],
        "We ship worldwide with door-to-door delivery, customs handling, and insurance \
         options. Standard delivery takes 3-7 business days depending on the route.",
    ),
    (
        &["account", "login", "password", "sign in", "register"],
        "You can manage your account from the Account page. If you cannot sign in, use \
         the password reset link on the login form.",
    ),
    (
        &["price", "pricing", "cost", "quote", "rate", "fee"],
        "Pricing depends on weight, dimensions, and destination. The Quote page gives an \
         instant estimate for any route.",
    ),
    (
        &["service", "services", "offer", "insurance", "express"],
        "We offer standard and express shipping, full-coverage insurance, customs \
         clearance, and warehousing. See the Services page for details.",
    ),
    (
        &["contact", "phone", "email", "call", "reach"],
        "You can reach us at support@deskwire.io or +1 (555) 010-4400 during business \
         hours, Monday to Friday.",
    ),
    (
        &["location", "address", "office", "branch", "warehouse"],
        "Our main office is at 140 Harbor Way, Oakland, CA, with drop-off points listed \
         on the Locations page.",
    ),
    (
        &["website", "site", "page", "online", "app"],
        "Most requests can be handled self-service on our website, including quotes, \
         bookings, and shipment tracking.",
    ),
    (
        &["hello", "hi", "hey", "good morning", "good afternoon", "good evening"],
        "Hello! I'm currently answering offline, so I can only help with common \
         questions. What can I do for you?",
    ),
];

/// Catch-all when no keyword category matches
const DEFAULT_RESPONSE: &str =
    "I'm currently offline and can only answer common questions about shipping, \
     tracking, pricing, and your account. Please try again later or email \
     support@deskwire.io.";

/// Produce a canned response for the given customer input
///
/// Matching is case-insensitive substring search over the categories in
/// priority order. Pure function; no state, no IO.
///
/// # Examples
///
/// ```
/// use deskwire::engine::fallback;
///
/// let reply = fallback::respond("What are your RATES?");
/// assert!(reply.contains("Pricing"));
/// ```
pub fn respond(input: &str) -> &'static str {
    let normalized = input.to_lowercase();

    for (keywords, response) in CATEGORIES {
        if keywords.iter().any(|k| normalized.contains(k)) {
            return response;
        }
    }

    DEFAULT_RESPONSE
}
