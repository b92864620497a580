//! Hand-curated items used when the wiki API cannot be reached.

use mirror_core::HarvestItem;

const FALLBACK: &[(&str, &str, &str)] = &[
    (
        "Castle in the Sky",
        "Castle_in_the_Sky.png",
        "https://upload.wikimedia.org/wikipedia/en/4/40/Castle_in_the_Sky_%281986%29.png",
    ),
    (
        "Kiki's Delivery Service",
        "Kiki's_Delivery_Service.jpg",
        "https://upload.wikimedia.org/wikipedia/en/0/07/Kiki%27s_Delivery_Service_%28Movie%29.jpg",
    ),
    (
        "My Neighbor Totoro",
        "My_Neighbor_Totoro.jpg",
        "https://upload.wikimedia.org/wikipedia/en/0/02/My_Neighbor_Totoro_-_Tonari_no_Totoro_%28Movie_Poster%29.jpg",
    ),
    (
        "Princess Mononoke",
        "Princess_Mononoke.png",
        "https://upload.wikimedia.org/wikipedia/en/8/8c/Princess_Mononoke_Japanese_poster.png",
    ),
    (
        "Spirited Away",
        "Spirited_Away.png",
        "https://upload.wikimedia.org/wikipedia/en/d/db/Spirited_Away_Japanese_poster.png",
    ),
];

pub fn fallback_items() -> Vec<HarvestItem> {
    FALLBACK
        .iter()
        .map(|(name, filename, url)| HarvestItem::new(*name, *filename, Some(*url)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::{normalize_fallback, sanitize_filename, ExtractRules};

    #[test]
    fn fallback_filenames_are_already_canonical() {
        let items = fallback_items();
        assert!(!items.is_empty());
        for item in &items {
            assert_eq!(sanitize_filename(&item.canonical_filename), item.canonical_filename);
            assert!(item.source_url.is_some());
        }
        assert_eq!(normalize_fallback(items.clone(), &ExtractRules::default()), items);
    }

    #[test]
    fn fallback_extensions_match_source_urls() {
        for item in fallback_items() {
            let url = item.source_url.unwrap_or_default();
            let (_, file_ext) = item.canonical_filename.rsplit_once('.').unwrap();
            let (_, url_ext) = url.rsplit_once('.').unwrap();
            assert!(
                url_ext.eq_ignore_ascii_case(file_ext),
                "{} saved from {url}",
                item.canonical_filename
            );
        }
    }
}
