use std::collections::{HashMap, HashSet};

use crate::filename::{clean_stem, is_plain_extension, sanitize_filename, sanitize_stem};
use crate::{ExtractRules, HarvestItem, ItemOrder, RawPage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rendition {
    Primary,
    Alternate,
}

struct Candidate {
    key: String,
    item: HarvestItem,
    rendition: Rendition,
}

/// Map raw page records to unique, ordered items.
///
/// Records sharing a subject collapse into one item: a primary rendition
/// replaces an alternate one, otherwise the first arrival is kept.
pub fn extract_items(pages: &[RawPage], rules: &ExtractRules) -> Vec<HarvestItem> {
    let mut selected: Vec<Candidate> = Vec::new();
    let mut by_subject: HashMap<String, usize> = HashMap::new();

    for page in pages {
        let Some(candidate) = candidate_from(page, rules) else {
            continue;
        };
        match by_subject.get(&candidate.key) {
            Some(&idx) => {
                let current = &mut selected[idx];
                if current.rendition == Rendition::Alternate
                    && candidate.rendition == Rendition::Primary
                {
                    *current = candidate;
                }
            }
            None => {
                by_subject.insert(candidate.key.clone(), selected.len());
                selected.push(candidate);
            }
        }
    }

    let mut items: Vec<HarvestItem> = selected.into_iter().map(|c| c.item).collect();
    apply_order(&mut items, rules.order);
    items
}

/// Bring hand-curated items in line with harvested ones: sanitized filenames,
/// one item per subject and the configured ordering.
pub fn normalize_fallback(items: Vec<HarvestItem>, rules: &ExtractRules) -> Vec<HarvestItem> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(items.len());
    for item in items {
        let stem = match item.canonical_filename.trim().rsplit_once('.') {
            Some((stem, ext)) if is_plain_extension(ext) => stem,
            _ => item.canonical_filename.as_str(),
        };
        if !seen.insert(subject_key(stem)) {
            continue;
        }
        let canonical_filename = sanitize_filename(&item.canonical_filename);
        normalized.push(HarvestItem {
            display_name: collapse_whitespace(&item.display_name),
            canonical_filename,
            source_url: item.source_url,
        });
    }
    apply_order(&mut normalized, rules.order);
    normalized
}

fn candidate_from(page: &RawPage, rules: &ExtractRules) -> Option<Candidate> {
    let title = page.title.trim();
    let rest = strip_namespace(title, &rules.namespaces)?;
    let (stem, ext) = rest.rsplit_once('.')?;
    if !rules.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
        return None;
    }
    if rules
        .exclusions
        .iter()
        .any(|excluded| title.contains(excluded.as_str()))
    {
        return None;
    }

    let name = normalize_name(stem, rules);
    let (name, rendition) = match strip_any_suffix(&name, &rules.alternate_markers, rules) {
        Some(stripped) => (stripped, Rendition::Alternate),
        None => (name, Rendition::Primary),
    };
    let name = strip_any_suffix(&name, &rules.subject_suffixes, rules).unwrap_or(name);
    if name.is_empty() {
        return None;
    }

    let canonical_filename = format!("{}.{}", sanitize_stem(&name), ext.to_ascii_lowercase());
    Some(Candidate {
        key: subject_key(&name),
        item: HarvestItem {
            display_name: name,
            canonical_filename,
            source_url: page.url.clone(),
        },
        rendition,
    })
}

fn strip_namespace<'a>(title: &'a str, namespaces: &[String]) -> Option<&'a str> {
    namespaces.iter().find_map(|ns| {
        title
            .get(..ns.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(ns))
            .map(|_| &title[ns.len()..])
    })
}

fn normalize_name(raw: &str, rules: &ExtractRules) -> String {
    collapse_whitespace(&replace_separators(&unescape(raw, rules), rules))
}

fn unescape(raw: &str, rules: &ExtractRules) -> String {
    rules
        .unescapes
        .iter()
        .fold(raw.to_string(), |acc, (escaped, literal)| {
            acc.replace(escaped.as_str(), literal)
        })
}

fn replace_separators(raw: &str, rules: &ExtractRules) -> String {
    raw.chars()
        .map(|c| if rules.separators.contains(&c) { ' ' } else { c })
        .collect()
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove the first matching suffix (ASCII case-insensitive). Suffixes are
/// written with separators (`_sq`) and compared in display form (` sq`).
fn strip_any_suffix(name: &str, suffixes: &[String], rules: &ExtractRules) -> Option<String> {
    suffixes.iter().find_map(|suffix| {
        let suffix = replace_separators(suffix, rules);
        if suffix.is_empty() || suffix.len() >= name.len() {
            return None;
        }
        let cut = name.len() - suffix.len();
        if !name.is_char_boundary(cut) || !name[cut..].eq_ignore_ascii_case(&suffix) {
            return None;
        }
        let stripped = name[..cut].trim_end();
        (!stripped.is_empty()).then(|| stripped.to_string())
    })
}

/// Full-length, case-insensitive subject, so renditions differing only in
/// extension or letter case share one file on case-insensitive filesystems.
fn subject_key(stem: &str) -> String {
    clean_stem(stem).to_lowercase()
}

fn apply_order(items: &mut [HarvestItem], order: ItemOrder) {
    match order {
        ItemOrder::Source => {}
        ItemOrder::DisplayName => items.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.canonical_filename.cmp(&b.canonical_filename))
        }),
    }
}
