use anyhow::Result;
use regex::{Captures, Regex};

const DIGITS: [&str; 10] = ["零", "一", "二", "三", "四", "五", "六", "七", "八", "九"];

const COUNTER_WORDS: &str = "万|亿|千|百|十|个|种|次|年|月|天|秒|分钟|小时|米|公里|吨|度";

fn digit(n: i64) -> &'static str {
    DIGITS[n.rem_euclid(10) as usize]
}

/// Spoken Chinese form of an integer. Values of 10000 and above are read
/// digit by digit.
pub fn number_to_chinese(num: i64) -> String {
    if num < 0 {
        return format!("负{}", number_to_chinese(num.saturating_neg()));
    }
    match num {
        0..=9 => digit(num).to_string(),
        10 => "十".to_string(),
        11..=19 => format!("十{}", digit(num % 10)),
        20..=99 => {
            let ones = num % 10;
            let ones = if ones == 0 { "" } else { digit(ones) };
            format!("{}十{}", digit(num / 10), ones)
        }
        100..=999 => {
            let hundreds = digit(num / 100);
            match num % 100 {
                0 => format!("{hundreds}百"),
                r @ 1..=9 => format!("{hundreds}百零{}", digit(r)),
                r => format!("{hundreds}百{}", number_to_chinese(r)),
            }
        }
        1000..=9999 => {
            let thousands = digit(num / 1000);
            match num % 1000 {
                0 => format!("{thousands}千"),
                r @ 1..=99 => format!("{thousands}千零{}", number_to_chinese(r)),
                r => format!("{thousands}千{}", number_to_chinese(r)),
            }
        }
        _ => digits_one_by_one(&num.to_string()),
    }
}

fn digits_one_by_one(digits: &str) -> String {
    digits
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => DIGITS[d as usize].to_string(),
            None => c.to_string(),
        })
        .collect()
}

/// Number literal followed by a counter word. Long literals never go through
/// integer parsing, so any length is read out.
fn spoken_number(literal: &str) -> String {
    let significant = literal.trim_start_matches('0');
    if significant.is_empty() {
        return DIGITS[0].to_string();
    }
    match significant.parse::<i64>() {
        Ok(value) if significant.len() <= 4 => number_to_chinese(value),
        _ => digits_one_by_one(significant),
    }
}

fn is_ascii_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrites narration into text that speech synthesis reads naturally.
pub struct Preprocessor {
    pause_markers: Regex,
    strong_emphasis: Regex,
    emphasis: Regex,
    counted_number: Regex,
    uppercase_run: Regex,
    symbols: Regex,
    whitespace: Regex,
}

impl Preprocessor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pause_markers: Regex::new(r"(?i)\[(?:PAUSE|BEAT)\]|\[\.{1,3}\]")?,
            strong_emphasis: Regex::new(r"\*\*([^*]+)\*\*")?,
            emphasis: Regex::new(r"\*([^*]+)\*")?,
            counted_number: Regex::new(&format!("([0-9]+)({COUNTER_WORDS})"))?,
            uppercase_run: Regex::new(r"[A-Z]{2,}")?,
            symbols: Regex::new(r"[→×÷]")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// `AI` becomes `A-I` so TTS spells it. Only whole ASCII words are touched.
    fn spell_abbreviations(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for m in self.uppercase_run.find_iter(text) {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            if before.is_some_and(is_ascii_word) || after.is_some_and(is_ascii_word) {
                continue;
            }
            out.push_str(&text[last..m.start()]);
            let spelled: Vec<String> = m.as_str().chars().map(String::from).collect();
            out.push_str(&spelled.join("-"));
            last = m.end();
        }
        out.push_str(&text[last..]);
        out
    }

    /// Prepare one narration segment for speech synthesis.
    pub fn apply(&self, text: &str) -> String {
        let result = self.pause_markers.replace_all(text, "");
        let result = self.strong_emphasis.replace_all(&result, "$1");
        let result = self.emphasis.replace_all(&result, "$1");
        let result = self.counted_number.replace_all(&result, |caps: &Captures| {
            format!("{}{}", spoken_number(&caps[1]), &caps[2])
        });
        let result = self.spell_abbreviations(&result);
        let result = self.symbols.replace_all(&result, "");
        self.whitespace.replace_all(&result, " ").trim().to_string()
    }
}
