const PACKED_LEN: usize = 32;

// Decodes a packed blob into dashed display form. The first three groups are byte-swapped,
// the last two are already in display order.
pub fn decode(blob: &str) -> String {
    let blob = blob.trim();
    if blob.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = blob.chars().take(PACKED_LEN).collect();
    let slice = |start: usize, end: usize| -> String {
        let end = end.min(chars.len());
        let start = start.min(end);
        chars[start..end].iter().collect()
    };

    let groups = [
        reverse_hex_pairs(&slice(0, 8)),
        reverse_hex_pairs(&slice(8, 12)),
        reverse_hex_pairs(&slice(12, 16)),
        slice(16, 20),
        slice(20, 32),
    ];
    groups.join("-").to_lowercase()
}

fn reverse_hex_pairs(group: &str) -> String {
    let chars: Vec<char> = group.chars().collect();
    let mut pairs: Vec<String> = Vec::with_capacity(chars.len() / 2);
    let mut index = 0;
    while index + 1 < chars.len() {
        let (high, low) = (chars[index], chars[index + 1]);
        if high.is_ascii_hexdigit() && low.is_ascii_hexdigit() {
            pairs.push([high, low].iter().collect());
            index += 2;
        } else {
            index += 1;
        }
    }
    pairs.reverse();
    pairs.concat()
}
