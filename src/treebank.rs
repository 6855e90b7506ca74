//! Penn-Treebank-style word tokenizer.
//!
//! A fixed, ordered pipeline of global regex substitutions over the input
//! string followed by a whitespace split. The rule set is the classic
//! NLTK treebank pipeline; the ordering is load-bearing because later rules
//! rely on spacing introduced by earlier ones. All patterns are written
//! without lookaheads so they run on a linear-time regex engine.

use regex::Regex;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("hard-coded tokenizer pattern must compile")
}

/// Rule-based word tokenizer.
///
/// Stateless after construction; [`tokenize`](TreebankTokenizer::tokenize)
/// is a pure function of its arguments and may be called from multiple
/// threads through a shared reference.
pub struct TreebankTokenizer {
    starting_quotes: Vec<(Regex, &'static str)>,
    punctuation: Vec<(Regex, &'static str)>,
    parens_brackets: (Regex, &'static str),
    convert_parentheses: Vec<(Regex, &'static str)>,
    double_dashes: (Regex, &'static str),
    ending_quotes: Vec<(Regex, &'static str)>,
    contractions2: Vec<Regex>,
    contractions3: Vec<Regex>,
}

impl Default for TreebankTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TreebankTokenizer {
    pub fn new() -> Self {
        let starting_quotes = vec![
            (pattern(r#"^""#), "``"),
            (pattern(r"(``)"), " $1 "),
            (pattern(r#"([ \(\[\{<])("|'{2})"#), "$1 `` "),
        ];

        let punctuation = vec![
            (pattern(r"([:,])([^\d])"), " $1 $2"),
            (pattern(r"([:,])$"), " $1 "),
            (pattern(r"\.\.\."), " ... "),
            (pattern(r"[;@#$%&]"), " $0 "),
            (pattern(r#"([^\.])(\.)([\]\)}>"']*)\s*$"#), "$1 $2$3 "),
            (pattern(r"[?!]"), " $0 "),
            (pattern(r"([^'])' "), "$1 ' "),
        ];

        let parens_brackets = (pattern(r"[\]\[\(\)\{\}<>]"), " $0 ");

        let convert_parentheses = vec![
            (pattern(r"\("), "-LRB-"),
            (pattern(r"\)"), "-RRB-"),
            (pattern(r"\["), "-LSB-"),
            (pattern(r"\]"), "-RSB-"),
            (pattern(r"\{"), "-LCB-"),
            (pattern(r"\}"), "-RCB-"),
        ];

        let double_dashes = (pattern(r"--"), " -- ");

        let ending_quotes = vec![
            (pattern(r"''"), " '' "),
            (pattern(r#"""#), " '' "),
            (pattern(r"([^' ])('[sS]|'[mM]|'[dD]|') "), "$1 $2 "),
            (pattern(r"([^' ])('ll|'LL|'re|'RE|'ve|'VE|n't|N'T) "), "$1 $2 "),
        ];

        // The regex engine has no lookahead, so the final pattern matches a
        // trailing whitespace character instead of asserting one.
        let contractions2 = vec![
            pattern(r"(?i)\b(can)(not)\b"),
            pattern(r"(?i)\b(d)('ye)\b"),
            pattern(r"(?i)\b(gim)(me)\b"),
            pattern(r"(?i)\b(gon)(na)\b"),
            pattern(r"(?i)\b(got)(ta)\b"),
            pattern(r"(?i)\b(lem)(me)\b"),
            pattern(r"(?i)\b(more)('n)\b"),
            pattern(r"(?i)\b(wan)(na)\s"),
        ];

        let contractions3 = vec![pattern(r"(?i) ('t)(is)\b"), pattern(r"(?i) ('t)(was)\b")];

        Self {
            starting_quotes,
            punctuation,
            parens_brackets,
            convert_parentheses,
            double_dashes,
            ending_quotes,
            contractions2,
            contractions3,
        }
    }

    /// Split `text` into treebank tokens.
    ///
    /// With `convert_parentheses` set, parentheses and brackets are rewritten
    /// to their `-LRB-` / `-RRB-` style placeholders after being split off.
    ///
    /// # Example
    ///
    /// ```
    /// use docscore::TreebankTokenizer;
    ///
    /// let tokenizer = TreebankTokenizer::new();
    /// let tokens = tokenizer.tokenize("They'll say \"hello\".", false);
    /// assert_eq!(tokens, ["They", "'ll", "say", "``", "hello", "''", "."]);
    /// ```
    pub fn tokenize(&self, text: &str, convert_parentheses: bool) -> Vec<String> {
        let mut result = text.to_string();

        for (re, rep) in &self.starting_quotes {
            result = re.replace_all(&result, *rep).into_owned();
        }

        for (re, rep) in &self.punctuation {
            result = re.replace_all(&result, *rep).into_owned();
        }

        let (re, rep) = &self.parens_brackets;
        result = re.replace_all(&result, *rep).into_owned();

        if convert_parentheses {
            for (re, rep) in &self.convert_parentheses {
                result = re.replace_all(&result, *rep).into_owned();
            }
        }

        let (re, rep) = &self.double_dashes;
        result = re.replace_all(&result, *rep).into_owned();

        // Pad so the edge rules below can anchor on a space.
        result = format!(" {result} ");

        for (re, rep) in &self.ending_quotes {
            result = re.replace_all(&result, *rep).into_owned();
        }

        for re in &self.contractions2 {
            result = re.replace_all(&result, " $1 $2 ").into_owned();
        }

        for re in &self.contractions3 {
            result = re.replace_all(&result, " $1 $2 ").into_owned();
        }

        result.split_whitespace().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_and_ending_quotes() {
        let tokenizer = TreebankTokenizer::new();
        assert_eq!(
            tokenizer.tokenize("\"Hello\"", false),
            vec!["``", "Hello", "''"]
        );
    }

    #[test]
    fn test_contractions() {
        let tokenizer = TreebankTokenizer::new();
        assert_eq!(
            tokenizer.tokenize("I cannot do that", false),
            vec!["I", "can", "not", "do", "that"]
        );
        assert_eq!(tokenizer.tokenize("gimme it", false), vec!["gim", "me", "it"]);
        assert_eq!(tokenizer.tokenize("wanna go", false), vec!["wan", "na", "go"]);
    }

    #[test]
    fn test_clitics_split() {
        let tokenizer = TreebankTokenizer::new();
        assert_eq!(
            tokenizer.tokenize("They'll say it's fine", false),
            vec!["They", "'ll", "say", "it", "'s", "fine"]
        );
        assert_eq!(
            tokenizer.tokenize("don't stop", false),
            vec!["do", "n't", "stop"]
        );
    }

    #[test]
    fn test_double_dash_and_ellipsis() {
        let tokenizer = TreebankTokenizer::new();
        assert_eq!(
            tokenizer.tokenize("wait--no... go", false),
            vec!["wait", "--", "no", "...", "go"]
        );
    }

    #[test]
    fn test_empty_input() {
        let tokenizer = TreebankTokenizer::new();
        assert!(tokenizer.tokenize("", false).is_empty());
        assert!(tokenizer.tokenize("   \n\t ", false).is_empty());
    }
}
