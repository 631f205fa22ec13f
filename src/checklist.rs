//! Document checklist extraction from narrative text
//!
//! The narrative is free prose from a language model, so this is a keyword
//! heuristic: bulleted or numbered lines that mention a travel document
//! become checklist items.

const DOCUMENT_KEYWORDS: [&str; 14] = [
    "passport",
    "visa",
    "permit",
    "insurance",
    "ticket",
    "proof",
    "certificate",
    "photo",
    "form",
    "license",
    "licence",
    "vaccination",
    "itinerary",
    "bank statement",
];

/// Strip a leading bullet (`-`, `*`, `•`) or list number (`1.`, `2)`)
fn list_item(line: &str) -> Option<&str> {
    let line = line.trim();
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix('•'))
    {
        return Some(rest.trim());
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    line[digits..]
        .strip_prefix('.')
        .or_else(|| line[digits..].strip_prefix(')'))
        .map(str::trim)
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Keyword match on whole words; the last keyword word may take a plural `s`
fn mentions(item_words: &[&str], keyword: &str) -> bool {
    let keyword = words(keyword);
    let Some((last, leading)) = keyword.split_last() else {
        return false;
    };
    item_words.windows(keyword.len()).any(|window| {
        let Some((tail, head)) = window.split_last() else {
            return false;
        };
        head == leading && (tail == last || tail.strip_suffix('s') == Some(*last))
    })
}

fn clean(item: &str) -> String {
    item.replace("**", "")
        .replace('`', "")
        .trim_end_matches([';', ','])
        .trim()
        .to_string()
}

/// Checklist items in narrative order, without case-insensitive duplicates
#[must_use]
pub fn extract_checklist(narrative: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for line in narrative.lines() {
        let Some(item) = list_item(line) else {
            continue;
        };
        let item = clean(item);
        let lowered = item.to_lowercase();
        let item_words = words(&lowered);
        if !DOCUMENT_KEYWORDS.iter().any(|k| mentions(&item_words, k)) {
            continue;
        }
        if !items.iter().any(|existing| existing.to_lowercase() == lowered) {
            items.push(item);
        }
    }
    items
}
