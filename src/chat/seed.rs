//! Built-in storefront knowledge and seed loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One seed pair as it appears in a seed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedEntry {
    /// Canonical input phrase.
    pub input: String,
    /// Response for the phrase.
    pub response: String,
}

/// Canned storefront answers the assistant starts with.
pub fn storefront_seed() -> Vec<(String, String)> {
    [
        ("hello", "Hi there! How can I help you today?"),
        ("hi", "Hello! How can I assist you?"),
        (
            "how are you",
            "I'm just a bot, but I'm functioning well! How can I help you?",
        ),
        (
            "help",
            "I can help you with product information, store locations, and basic troubleshooting. What do you need?",
        ),
        (
            "bye",
            "Goodbye! Feel free to chat again if you need assistance.",
        ),
        (
            "thank you",
            "You're welcome! Is there anything else I can help with?",
        ),
        (
            "thanks",
            "You're welcome! Is there anything else I can help with?",
        ),
        (
            "product",
            "We offer smartphones, laptops, and accessories. Which category are you interested in?",
        ),
        (
            "smartphone",
            "We have the latest models from Apple, Samsung, and other brands. Would you like specific information?",
        ),
        (
            "laptop",
            "Our laptop collection includes gaming, business, and everyday use models. What are you looking for?",
        ),
        (
            "store",
            "You can find our stores in major cities. Use the store locator on the customer dashboard to find the nearest one.",
        ),
        (
            "price",
            "Prices vary by product. You can check specific prices on the product pages or visit a store near you.",
        ),
        (
            "discount",
            "We regularly offer discounts and promotions. Check the offers section for current deals.",
        ),
        (
            "warranty",
            "Most products come with a standard 1-year warranty. Extended warranty options are available at checkout.",
        ),
        (
            "return policy",
            "We offer a 30-day return policy for most products, provided they're in original condition with packaging.",
        ),
    ]
    .into_iter()
    .map(|(input, response)| (input.to_string(), response.to_string()))
    .collect()
}

/// Generic answers for utterances nothing else matches.
pub fn default_fallbacks() -> Vec<String> {
    [
        "I'm not sure I understand. Could you rephrase that?",
        "I don't have information on that yet. Can I help with something else?",
        "I'm still learning! Could you try asking something else?",
        "I don't have an answer for that. Would you like to know about our products or stores instead?",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Parse a JSON array of `{"input": ..., "response": ...}` objects, keeping
/// file order.
pub fn parse_seed(json: &str) -> Result<Vec<(String, String)>> {
    let entries: Vec<SeedEntry> = serde_json::from_str(json)?;
    Ok(entries
        .into_iter()
        .map(|entry| (entry.input, entry.response))
        .collect())
}

/// Load seed pairs from a JSON file.
pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path)?;
    parse_seed(&content)
}
