use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::{normalize_for_search, CanonicalItem};

const SECONDS_PER_DAY: i64 = 86_400;
const MAX_RECENCY_BONUS: i64 = 400;

pub fn search(items: &[CanonicalItem], query: &str, limit: usize) -> Vec<CanonicalItem> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0);
    search_at(items, query, limit, now)
}

pub fn search_at(
    items: &[CanonicalItem],
    query: &str,
    limit: usize,
    now_epoch_secs: i64,
) -> Vec<CanonicalItem> {
    if limit == 0 || items.is_empty() {
        return Vec::new();
    }

    let normalized_query = normalize_for_search(query);
    if normalized_query.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(i64, usize, &CanonicalItem)> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            score_item(item, &normalized_query, now_epoch_secs).map(|score| (score, index, item))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    scored
        .into_iter()
        .take(limit)
        .map(|(_, _, item)| item.clone())
        .collect()
}

fn score_item(item: &CanonicalItem, normalized_query: &str, now_epoch_secs: i64) -> Option<i64> {
    let text_score = item
        .normalized_keys()
        .iter()
        .filter_map(|key| score_normalized_key(key, normalized_query))
        .max()?;
    let missing_penalty = if item.exists { 0 } else { 200 };

    Some(text_score + recency_bonus(item.sort_key, now_epoch_secs) - missing_penalty)
}

// Up to 400 points, losing one per day of age. Unknown or future times get nothing.
fn recency_bonus(sort_key: i64, now_epoch_secs: i64) -> i64 {
    if sort_key <= 0 || sort_key > now_epoch_secs {
        return 0;
    }

    let age_days = (now_epoch_secs - sort_key) / SECONDS_PER_DAY;
    (MAX_RECENCY_BONUS - age_days).clamp(0, MAX_RECENCY_BONUS)
}

fn score_normalized_key(normalized_key: &str, query: &str) -> Option<i64> {
    if normalized_key.is_empty() || query.is_empty() {
        return None;
    }

    if let Some(position) = normalized_key.find(query) {
        let prefix_bonus = if position == 0 { 400 } else { 0 };
        let compact_bonus = (query.len() as i64) * 40;
        let position_penalty = position as i64;
        let length_penalty = (normalized_key.len() as i64 - query.len() as i64).abs();
        return Some(10_000 + prefix_bonus + compact_bonus - position_penalty - length_penalty);
    }

    let positions = subsequence_positions(normalized_key, query)?;
    let start_penalty = positions[0] as i64;
    let gap_penalty: i64 = positions
        .windows(2)
        .map(|pair| pair[1].saturating_sub(pair[0] + 1) as i64)
        .sum();
    let length_penalty = (normalized_key.len() as i64 - query.len() as i64).max(0);

    Some(5_000 + (query.len() as i64) * 30 - gap_penalty * 6 - start_penalty - length_penalty)
}

fn subsequence_positions(haystack: &str, needle: &str) -> Option<Vec<usize>> {
    let mut positions = Vec::with_capacity(needle.len());
    let mut next_start = 0;

    for needle_char in needle.chars() {
        let mut found = None;
        for (offset, hay_char) in haystack[next_start..].char_indices() {
            if hay_char == needle_char {
                let absolute = next_start + offset;
                found = Some(absolute);
                next_start = absolute + hay_char.len_utf8();
                break;
            }
        }

        let position = found?;
        positions.push(position);
    }

    Some(positions)
}

#[cfg(test)]
mod tests {
    use super::recency_bonus;

    #[test]
    fn recency_bonus_decays_per_day() {
        let now = 1_700_000_000;
        assert_eq!(recency_bonus(now, now), 400);
        assert_eq!(recency_bonus(now - 10 * 86_400, now), 390);
        assert_eq!(recency_bonus(now - 1_000 * 86_400, now), 0);
        assert_eq!(recency_bonus(0, now), 0);
    }
}
