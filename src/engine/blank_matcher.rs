use crate::engine::letter_pool::RequirementMap;

/// Indices of every blank marker in the sentence, ascending.
pub fn blank_positions(sentence: &[char], marker: char) -> Vec<usize> {
    sentence
        .iter()
        .enumerate()
        .filter(|&(_, &ch)| ch == marker)
        .map(|(i, _)| i)
        .collect()
}

/// Blank positions whose answer-key letter equals `letter`, ascending.
///
/// Positions past the end of the answer key never qualify; length agreement
/// is checked once at load time.
pub fn positions_for(
    letter: char,
    sentence: &[char],
    answer_key: &[char],
    marker: char,
) -> Vec<usize> {
    sentence
        .iter()
        .zip(answer_key)
        .enumerate()
        .filter(|&(_, (&s, &k))| s == marker && k == letter)
        .map(|(i, _)| i)
        .collect()
}

/// Letter -> count of blanks it must fill, read from the answer key at blank positions.
pub fn requirement_map(sentence: &[char], answer_key: &[char], marker: char) -> RequirementMap {
    let mut map = RequirementMap::new();
    for (&s, &k) in sentence.iter().zip(answer_key) {
        if s == marker {
            *map.entry(k).or_insert(0) += 1;
        }
    }
    map
}
