//! Porter stemming algorithm.
//!
//! Applies the five rewrite steps of Porter (1980):
//! 1. Plurals and -ed/-ing suffixes
//! 2. -ational -> -ate, -tional -> -tion, etc.
//! 3. -icate -> -ic, -ative -> "", etc.
//! 4. Remove -al, -ance, -ence, etc.
//! 5. Remove final -e and -ll
//!
//! Only lowercase ASCII words are rewritten; anything else is returned as is.

/// Porter suffix-stripping stemmer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

const STEP2: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("abli", "able"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
];

const STEP3: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

const STEP4: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

impl PorterStemmer {
    pub fn new() -> Self {
        Self
    }

    pub fn stem(&self, word: &str) -> String {
        if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
            return word.to_string();
        }

        let mut w = Word {
            b: word.as_bytes().to_vec(),
        };
        w.step1a();
        w.step1b();
        w.step1c();
        w.step2();
        w.step3();
        w.step4();
        w.step5();
        w.b.into_iter().map(char::from).collect()
    }
}

struct Word {
    b: Vec<u8>,
}

impl Word {
    fn is_consonant(&self, i: usize) -> bool {
        match self.b[i] {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !self.is_consonant(i - 1),
            _ => true,
        }
    }

    /// Number of vowel-consonant sequences in the first `len` letters.
    fn measure(&self, len: usize) -> usize {
        let mut m = 0;
        let mut i = 0;
        while i < len && self.is_consonant(i) {
            i += 1;
        }
        loop {
            while i < len && !self.is_consonant(i) {
                i += 1;
            }
            if i >= len {
                return m;
            }
            while i < len && self.is_consonant(i) {
                i += 1;
            }
            m += 1;
        }
    }

    fn has_vowel(&self, len: usize) -> bool {
        (0..len).any(|i| !self.is_consonant(i))
    }

    fn double_consonant(&self, len: usize) -> bool {
        len >= 2 && self.b[len - 1] == self.b[len - 2] && self.is_consonant(len - 1)
    }

    /// consonant-vowel-consonant ending, where the last consonant is not w, x or y
    fn cvc(&self, len: usize) -> bool {
        len >= 3
            && self.is_consonant(len - 3)
            && !self.is_consonant(len - 2)
            && self.is_consonant(len - 1)
            && !matches!(self.b[len - 1], b'w' | b'x' | b'y')
    }

    fn ends(&self, suffix: &str) -> bool {
        self.b.ends_with(suffix.as_bytes())
    }

    fn stem_len(&self, suffix: &str) -> usize {
        self.b.len() - suffix.len()
    }

    fn replace(&mut self, suffix: &str, replacement: &str) {
        let len = self.stem_len(suffix);
        self.b.truncate(len);
        self.b.extend_from_slice(replacement.as_bytes());
    }

    /// Replaces the first matching suffix of `rules` when the remaining stem has measure > 0.
    fn replace_first(&mut self, rules: &[(&str, &str)]) {
        if let Some((suffix, replacement)) = rules.iter().find(|(suffix, _)| self.ends(suffix)) {
            if self.measure(self.stem_len(suffix)) > 0 {
                self.replace(suffix, replacement);
            }
        }
    }

    fn step1a(&mut self) {
        if self.ends("sses") {
            self.replace("sses", "ss");
        } else if self.ends("ies") {
            self.replace("ies", "i");
        } else if !self.ends("ss") && self.ends("s") {
            self.b.pop();
        }
    }

    fn step1b(&mut self) {
        if self.ends("eed") {
            if self.measure(self.stem_len("eed")) > 0 {
                self.b.pop();
            }
            return;
        }

        let stripped = ["ed", "ing"]
            .into_iter()
            .find(|suffix| self.ends(suffix) && self.has_vowel(self.stem_len(suffix)));
        let Some(suffix) = stripped else {
            return;
        };
        self.replace(suffix, "");

        let len = self.b.len();
        if self.ends("at") || self.ends("bl") || self.ends("iz") {
            self.b.push(b'e');
        } else if self.double_consonant(len) && !matches!(self.b[len - 1], b'l' | b's' | b'z') {
            self.b.pop();
        } else if self.measure(len) == 1 && self.cvc(len) {
            self.b.push(b'e');
        }
    }

    fn step1c(&mut self) {
        let len = self.b.len();
        if self.ends("y") && self.has_vowel(len - 1) {
            self.b[len - 1] = b'i';
        }
    }

    fn step2(&mut self) {
        self.replace_first(STEP2);
    }

    fn step3(&mut self) {
        self.replace_first(STEP3);
    }

    fn step4(&mut self) {
        let matched = STEP4.iter().find(|suffix| {
            if !self.ends(suffix) {
                return false;
            }
            if **suffix == "ion" {
                let len = self.stem_len(suffix);
                return len > 0 && matches!(self.b[len - 1], b's' | b't');
            }
            true
        });
        if let Some(suffix) = matched {
            let len = self.stem_len(suffix);
            if self.measure(len) > 1 {
                self.b.truncate(len);
            }
        }
    }

    fn step5(&mut self) {
        let len = self.b.len();
        if self.ends("e") {
            let m = self.measure(len - 1);
            if m > 1 || (m == 1 && !self.cvc(len - 1)) {
                self.b.pop();
            }
        }

        let len = self.b.len();
        if self.ends("l") && self.double_consonant(len) && self.measure(len) > 1 {
            self.b.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_known_words() {
        let stemmer = PorterStemmer::new();
        let cases = [
            ("caresses", "caress"),
            ("ponies", "poni"),
            ("cats", "cat"),
            ("running", "run"),
            ("hopping", "hop"),
            ("agreed", "agre"),
            ("flies", "fli"),
            ("happy", "happi"),
            ("sky", "sky"),
            ("relational", "relat"),
            ("traditional", "tradit"),
            ("generalization", "gener"),
            ("connections", "connect"),
        ];
        for (word, expected) in cases {
            assert_eq!(stemmer.stem(word), expected, "stem of {}", word);
        }
    }

    #[test]
    fn test_short_and_foreign_words_unchanged() {
        let stemmer = PorterStemmer::new();
        assert_eq!(stemmer.stem("is"), "is");
        assert_eq!(stemmer.stem("звонки"), "звонки");
        assert_eq!(stemmer.stem("café"), "café");
        assert_eq!(stemmer.stem(""), "");
    }
}
