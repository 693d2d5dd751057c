//! Content formula evaluator.
//!
//! Skills, weapons and consumables describe their numbers as small
//! arithmetic expressions over stat tokens and dice notation, e.g.
//! `[STR]+1d2`, `2d6*2`, `[WIS]+[LVL]/2`. This module evaluates them with
//! an explicit recursive-descent parser over a fixed grammar; content never
//! executes as code.
//!
//! The evaluator fails soft: malformed content yields 1 instead of an
//! error, so bad data degrades a hit to a scratch rather than crashing
//! combat mid-encounter.

use rand::Rng;

use super::constants::{DICE_MAX_COUNT, DICE_MAX_SIDES};
use crate::character::stats::Stats;

/// Evaluates a formula to a non-negative integer. Stat tokens `STR` `DEX`
/// `CON` `WIS` `LVL` are case-insensitive and may be bracketed; `NdM` rolls
/// N dice with M sides. Returns 1 on any parse or evaluation failure.
pub fn calc_value(formula: &str, stats: &Stats, level: u32, rng: &mut impl Rng) -> i64 {
    match evaluate(formula, stats, level, rng) {
        Ok(v) if v.is_finite() => v.floor().max(0.0) as i64,
        _ => 1,
    }
}

/// Recognizes percent-style amounts (`"50%"`, `"100%"`) used by heal and
/// revive content, returning the fraction. Not part of the expression
/// grammar; callers decide what the percentage is of.
pub fn parse_percent(formula: &str) -> Option<f64> {
    let stripped = formula.trim().strip_suffix('%')?;
    stripped
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| *v >= 0.0)
        .map(|v| v / 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Dice(u32, u32),
    Stat(StatToken),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StatToken {
    Str,
    Dex,
    Con,
    Wis,
    Lvl,
}

fn evaluate(formula: &str, stats: &Stats, level: u32, rng: &mut impl Rng) -> Result<f64, ()> {
    let tokens = lex(formula)?;
    if tokens.is_empty() {
        return Err(());
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        stats,
        level,
        rng,
    };
    let value = parser.expression()?;
    // Trailing garbage after a valid expression is still malformed content.
    if parser.pos != parser.tokens.len() {
        return Err(());
    }
    Ok(value)
}

fn lex(input: &str) -> Result<Vec<Token>, ()> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            // Brackets around stat tokens are decorative
            ' ' | '\t' | '[' | ']' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                // Dice notation: digits immediately followed by d<digits>
                if i + 1 < chars.len()
                    && (chars[i] == 'd' || chars[i] == 'D')
                    && chars[i + 1].is_ascii_digit()
                {
                    let count: u32 = chars[start..i]
                        .iter()
                        .collect::<String>()
                        .parse()
                        .map_err(|_| ())?;
                    i += 1;
                    let sides_start = i;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    let sides: u32 = chars[sides_start..i]
                        .iter()
                        .collect::<String>()
                        .parse()
                        .map_err(|_| ())?;
                    if count == 0 || count > DICE_MAX_COUNT || sides == 0 || sides > DICE_MAX_SIDES
                    {
                        return Err(());
                    }
                    tokens.push(Token::Dice(count, sides));
                } else {
                    // Plain number, optionally with a fractional part
                    if i < chars.len() && chars[i] == '.' {
                        i += 1;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                    let number: f64 = chars[start..i]
                        .iter()
                        .collect::<String>()
                        .parse()
                        .map_err(|_| ())?;
                    tokens.push(Token::Number(number));
                }
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect::<String>().to_lowercase();
                let stat = match word.as_str() {
                    "str" => StatToken::Str,
                    "dex" => StatToken::Dex,
                    "con" => StatToken::Con,
                    "wis" => StatToken::Wis,
                    "lvl" => StatToken::Lvl,
                    _ => return Err(()),
                };
                tokens.push(Token::Stat(stat));
            }
            _ => return Err(()),
        }
    }

    Ok(tokens)
}

struct Parser<'a, R: Rng> {
    tokens: &'a [Token],
    pos: usize,
    stats: &'a Stats,
    level: u32,
    rng: &'a mut R,
}

impl<R: Rng> Parser<'_, R> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expression(&mut self) -> Result<f64, ()> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Token::Minus => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ()> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                Token::Slash => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(());
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, ()> {
        match self.next().ok_or(())? {
            Token::Number(n) => Ok(n),
            Token::Dice(count, sides) => {
                let mut total = 0u32;
                for _ in 0..count {
                    total += self.rng.gen_range(1..=sides);
                }
                Ok(f64::from(total))
            }
            Token::Stat(stat) => Ok(match stat {
                StatToken::Str => f64::from(self.stats.strength),
                StatToken::Dex => f64::from(self.stats.dexterity),
                StatToken::Con => f64::from(self.stats.constitution),
                StatToken::Wis => f64::from(self.stats.wisdom),
                StatToken::Lvl => f64::from(self.level),
            }),
            Token::Minus => Ok(-self.factor()?),
            Token::LParen => {
                let value = self.expression()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(()),
                }
            }
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn stats() -> Stats {
        Stats {
            strength: 5,
            constitution: 4,
            dexterity: 6,
            wisdom: 3,
            hit_chance: 70,
            skill_slots: 4,
        }
    }

    #[test]
    fn test_dice_range() {
        let mut rng = test_rng();
        for _ in 0..200 {
            let v = calc_value("2d6", &stats(), 1, &mut rng);
            assert!((2..=12).contains(&v), "2d6 out of range: {v}");
        }
    }

    #[test]
    fn test_stat_plus_dice() {
        let mut rng = test_rng();
        for _ in 0..200 {
            let v = calc_value("[STR]+1d2", &stats(), 1, &mut rng);
            assert!((6..=7).contains(&v), "[STR]+1d2 out of range: {v}");
        }
    }

    #[test]
    fn test_case_insensitive_and_unbracketed() {
        let mut rng = test_rng();
        assert_eq!(calc_value("str+dex", &stats(), 1, &mut rng), 11);
        assert_eq!(calc_value("[wis]*2", &stats(), 1, &mut rng), 6);
    }

    #[test]
    fn test_level_token() {
        let mut rng = test_rng();
        assert_eq!(calc_value("3*[LVL]", &stats(), 4, &mut rng), 12);
    }

    #[test]
    fn test_arithmetic_and_floor() {
        let mut rng = test_rng();
        assert_eq!(calc_value("10/2+1", &stats(), 1, &mut rng), 6);
        assert_eq!(calc_value("7/2", &stats(), 1, &mut rng), 3);
        assert_eq!(calc_value("(2+3)*2", &stats(), 1, &mut rng), 10);
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        let mut rng = test_rng();
        assert_eq!(calc_value("2-10", &stats(), 1, &mut rng), 0);
    }

    #[test]
    fn test_fail_soft() {
        let mut rng = test_rng();
        assert_eq!(calc_value("not a formula", &stats(), 1, &mut rng), 1);
        assert_eq!(calc_value("", &stats(), 1, &mut rng), 1);
        assert_eq!(calc_value("1+", &stats(), 1, &mut rng), 1);
        assert_eq!(calc_value("5/0", &stats(), 1, &mut rng), 1);
        assert_eq!(calc_value("0d6", &stats(), 1, &mut rng), 1);
        assert_eq!(calc_value("1d0", &stats(), 1, &mut rng), 1);
        assert_eq!(calc_value("2 3", &stats(), 1, &mut rng), 1);
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("50%"), Some(0.5));
        assert_eq!(parse_percent(" 100% "), Some(1.0));
        assert_eq!(parse_percent("2d6"), None);
        assert_eq!(parse_percent("%"), None);
    }
}
