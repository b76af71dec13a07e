use std::collections::BTreeMap;

/// Letter -> number of blanks that letter must fill.
pub type RequirementMap = BTreeMap<char, usize>;

/// Count occurrences of each letter in a list.
pub fn frequency(letters: &[char]) -> RequirementMap {
    let mut map = RequirementMap::new();
    for &ch in letters {
        *map.entry(ch).or_insert(0) += 1;
    }
    map
}

/// Multiset of letters currently offerable to the learner.
///
/// Order is the designer's order followed by any padding copies; it only
/// matters for presentation and deterministic tests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LetterPool {
    letters: Vec<char>,
}

impl LetterPool {
    /// Start from the designer set and append exactly the deficit for every
    /// required letter. Designer extras (distractors) are never removed.
    pub fn build(designer: &[char], required: &RequirementMap) -> Self {
        let mut letters = designer.to_vec();
        for (&ch, &needed) in required {
            let available = letters.iter().filter(|&&l| l == ch).count();
            if available < needed {
                letters.extend(std::iter::repeat_n(ch, needed - available));
            }
        }
        Self { letters }
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn count(&self, ch: char) -> usize {
        self.letters.iter().filter(|&&l| l == ch).count()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.letters.contains(&ch)
    }

    /// Distinct letters in first-seen order.
    pub fn distinct(&self) -> Vec<char> {
        let mut seen = Vec::new();
        for &ch in &self.letters {
            if !seen.contains(&ch) {
                seen.push(ch);
            }
        }
        seen
    }

    /// Remove up to `n` copies of `ch`, latest first. Returns how many were removed.
    pub fn take(&mut self, ch: char, n: usize) -> usize {
        let mut removed = 0;
        while removed < n {
            match self.letters.iter().rposition(|&l| l == ch) {
                Some(idx) => {
                    self.letters.remove(idx);
                    removed += 1;
                }
                None => break,
            }
        }
        removed
    }

    /// True when every required letter has at least its required count.
    pub fn satisfies(&self, required: &RequirementMap) -> bool {
        required.iter().all(|(&ch, &needed)| self.count(ch) >= needed)
    }
}
