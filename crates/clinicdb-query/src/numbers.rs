//! Working-text normalization and number-word conversion.

use once_cell::sync::Lazy;
use regex::Regex;

static THOUSANDS_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d),(\d{3})\b").expect("separator pattern must compile"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberWord {
    Unit(u64),
    Hundred,
    Thousand,
}

fn number_word(word: &str) -> Option<NumberWord> {
    let unit = match word {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" | "fourty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        "hundred" => return Some(NumberWord::Hundred),
        "thousand" => return Some(NumberWord::Thousand),
        _ => return None,
    };
    Some(NumberWord::Unit(unit))
}

/// Splits a token into number words; hyphenated compounds ("twenty-five")
/// count only when every part is a number word.
fn token_number_words(token: &str) -> Option<Vec<NumberWord>> {
    token.split('-').map(number_word).collect()
}

/// "four-star" becomes "4-star"; tokens without a leading number word are left alone.
fn rewrite_hyphenated(token: &str) -> Option<String> {
    let parts: Vec<&str> = token.split('-').collect();
    let leading = parts.iter().take_while(|p| number_word(p).is_some()).count();
    if leading == 0 || leading == parts.len() {
        return None;
    }
    let value = words_value(&parts[..leading])?;
    Some(format!("{}-{}", value, parts[leading..].join("-")))
}

/// Value of a run of number words: "one hundred fifty" is 150.
pub fn words_value(words: &[&str]) -> Option<u64> {
    let mut parsed = Vec::new();
    for w in words {
        parsed.extend(token_number_words(w)?);
    }
    if parsed.is_empty() {
        return None;
    }
    let (mut total, mut current) = (0u64, 0u64);
    for word in parsed {
        match word {
            NumberWord::Unit(n) => current = current.saturating_add(n),
            NumberWord::Hundred => current = current.max(1).saturating_mul(100),
            NumberWord::Thousand => {
                total = total.saturating_add(current.max(1).saturating_mul(1000));
                current = 0;
            }
        }
    }
    Some(total.saturating_add(current))
}

/// Lowercases, strips everything except ASCII alphanumerics and `$ . + -`,
/// and rewrites number-word runs as digits.
///
/// The result is pure ASCII, so byte offsets into it are always char boundaries.
pub fn normalize(text: &str) -> String {
    let text = THOUSANDS_SEPARATOR.replace_all(text, "$1$2");
    let cleaned: String = text
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c.to_ascii_lowercase(),
            '$' | '.' | '+' | '-' => c,
            _ => ' ',
        })
        .collect();

    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if token_number_words(tokens[i]).is_none() {
            out.push(rewrite_hyphenated(tokens[i]).unwrap_or_else(|| tokens[i].to_string()));
            i += 1;
            continue;
        }
        let start = i;
        i += 1;
        while i < tokens.len() {
            if token_number_words(tokens[i]).is_some() {
                i += 1;
            } else if tokens[i] == "and"
                && matches!(tokens[i - 1], "hundred" | "thousand")
                && tokens.get(i + 1).is_some_and(|t| token_number_words(t).is_some())
            {
                i += 1;
            } else {
                break;
            }
        }
        let run: Vec<&str> = tokens[start..i].iter().copied().filter(|t| *t != "and").collect();
        match words_value(&run) {
            Some(v) => out.push(v.to_string()),
            None => out.extend(run.iter().map(|t| (*t).to_string())),
        }
    }
    out.join(" ")
}
