//! 엔티티 이름 생성 -- 시드 고정 시 재현 가능한 이름 전략
//!
//! 시나리오는 전역 난수 대신 [`NameStrategy`]로 이름을 얻습니다.
//! 같은 시드의 [`RandomNames`]는 항상 같은 이름 시퀀스를 만듭니다.

use std::collections::VecDeque;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// 생성할 문자열 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringKind {
    Alpha,
    Numeric,
    Alphanumeric,
    Latin1,
    Utf8,
    Cjk,
    Html,
}

impl StringKind {
    /// 모든 종류 (매개변수화 입력 순서)
    pub const ALL: [StringKind; 7] = [
        Self::Alpha,
        Self::Numeric,
        Self::Alphanumeric,
        Self::Latin1,
        Self::Utf8,
        Self::Cjk,
        Self::Html,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Numeric => "numeric",
            Self::Alphanumeric => "alphanumeric",
            Self::Latin1 => "latin1",
            Self::Utf8 => "utf8",
            Self::Cjk => "cjk",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for StringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const HTML_TAGS: &[&str] = &["a", "b", "em", "i", "p", "strong"];

/// 유니코드 코드포인트 구간 (양 끝 포함)
const UTF8_RANGES: &[(u32, u32)] = &[
    (0x0100, 0x017F), // Latin Extended-A
    (0x0391, 0x03A1), // Greek capitals (U+03A2 is unassigned)
    (0x03A3, 0x03A9),
    (0x0410, 0x044F), // Cyrillic
    (0x05D0, 0x05EA), // Hebrew
];
const CJK_RANGE: (u32, u32) = (0x4E00, 0x9FFF);

/// 시드 기반 문자열 생성기
#[derive(Debug, Clone)]
pub struct NameGenerator {
    rng: StdRng,
}

impl NameGenerator {
    /// 시드가 없으면 운영체제 엔트로피를 사용합니다.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    /// `len`개 문자로 된 문자열을 생성합니다. `Html`은 태그 안쪽 텍스트 길이입니다.
    pub fn gen_string(&mut self, kind: StringKind, len: usize) -> String {
        let len = len.max(1);
        match kind {
            StringKind::Alpha => self.pick_ascii(ALPHA, len),
            StringKind::Numeric => self.pick_ascii(DIGITS, len),
            StringKind::Alphanumeric => {
                // 최소 한 글자는 영문자, 한 글자는 숫자가 되도록
                let mut chars: Vec<char> = self.pick_ascii(ALPHA, 1).chars().collect();
                if len > 1 {
                    chars.extend(self.pick_ascii(DIGITS, 1).chars());
                }
                let pool: Vec<u8> = ALPHA.iter().chain(DIGITS.iter()).copied().collect();
                while chars.len() < len {
                    chars.extend(self.pick_ascii(&pool, 1).chars());
                }
                chars.shuffle(&mut self.rng);
                chars.into_iter().collect()
            }
            StringKind::Latin1 => (0..len).map(|_| self.latin1_char()).collect(),
            StringKind::Utf8 => (0..len)
                .map(|_| {
                    let idx = self.rng.gen_range(0..UTF8_RANGES.len());
                    let (lo, hi) = UTF8_RANGES[idx];
                    self.char_in(lo, hi)
                })
                .collect(),
            StringKind::Cjk => (0..len)
                .map(|_| self.char_in(CJK_RANGE.0, CJK_RANGE.1))
                .collect(),
            StringKind::Html => {
                let tag = HTML_TAGS.choose(&mut self.rng).copied().unwrap_or("b");
                let text = self.pick_ascii(ALPHA, len);
                format!("<{tag}>{text}</{tag}>")
            }
        }
    }

    /// 종류마다 하나씩, 유효한 이름 목록
    pub fn strings_list(&mut self, len: usize) -> Vec<(StringKind, String)> {
        StringKind::ALL
            .iter()
            .map(|kind| (*kind, self.gen_string(*kind, len)))
            .collect()
    }

    fn pick_ascii(&mut self, pool: &[u8], len: usize) -> String {
        (0..len)
            .map(|_| char::from(pool[self.rng.gen_range(0..pool.len())]))
            .collect()
    }

    fn latin1_char(&mut self) -> char {
        // À..ÿ, 곱셈/나눗셈 기호 제외
        loop {
            let c = self.char_in(0x00C0, 0x00FF);
            if c != '\u{00D7}' && c != '\u{00F7}' {
                return c;
            }
        }
    }

    fn char_in(&mut self, lo: u32, hi: u32) -> char {
        let code = self.rng.gen_range(lo..=hi);
        char::from_u32(code).unwrap_or('x')
    }
}

/// 이름 생성 전략
pub trait NameStrategy: Send {
    fn next_name(&mut self, kind: StringKind) -> String;
}

/// 시드 기반 난수 이름
#[derive(Debug, Clone)]
pub struct RandomNames {
    generator: NameGenerator,
    length: usize,
}

impl RandomNames {
    pub fn new(seed: Option<u64>, length: usize) -> Self {
        Self {
            generator: NameGenerator::new(seed),
            length,
        }
    }
}

impl NameStrategy for RandomNames {
    fn next_name(&mut self, kind: StringKind) -> String {
        self.generator.gen_string(kind, self.length)
    }
}

/// 미리 정한 이름을 순서대로 사용하고, 소진되면 생성기로 넘어갑니다.
#[derive(Debug, Clone)]
pub struct FixedNames {
    queue: VecDeque<String>,
    fallback: RandomNames,
}

impl FixedNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: names.into_iter().map(Into::into).collect(),
            fallback: RandomNames::new(Some(0), 10),
        }
    }

    /// 소진 후 사용할 생성기를 지정합니다.
    pub fn with_fallback(mut self, fallback: RandomNames) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl NameStrategy for FixedNames {
    fn next_name(&mut self, kind: StringKind) -> String {
        self.queue
            .pop_front()
            .unwrap_or_else(|| self.fallback.next_name(kind))
    }
}

/// 시나리오 이름과 기본 시드로 시나리오별 시드를 만듭니다 (FNV-1a).
///
/// 시나리오를 골라 실행해도 각 시나리오의 이름 시퀀스는 바뀌지 않습니다.
pub fn scenario_seed(base: u64, scenario_name: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325 ^ base;
    for byte in scenario_name.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// 실행마다 달라지는 이름 꼬리표
///
/// 조직, 위치, 인증 소스처럼 애플리케이션 전체에서 이름이 유일해야 하는 엔티티는
/// 시드로 만든 이름 뒤에 이 꼬리표를 붙입니다. 같은 시드로 다시 실행해도 이전 실행이
/// 남긴 엔티티와 충돌하지 않고, 그 안에서 만드는 엔티티 이름은 시드대로 재현됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTag(u64);

impl RunTag {
    /// 꼬리표 글자 수
    pub const LEN: usize = 6;

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// 실행 ID(uuid 문자열)에서 꼬리표를 만듭니다.
    pub fn from_run_id(run_id: &str) -> Self {
        Self(scenario_seed(0, run_id))
    }

    pub fn fresh() -> Self {
        Self(rand::random())
    }

    /// `kind`의 문자로 된 꼬리표. `Html`은 태그 밖에 붙으므로 영문자를 씁니다.
    pub fn suffix(&self, kind: StringKind) -> String {
        let kind = match kind {
            StringKind::Html => StringKind::Alpha,
            other => other,
        };
        NameGenerator::seeded(self.0).gen_string(kind, Self::LEN)
    }

    pub fn apply(&self, name: String, kind: StringKind) -> String {
        name + &self.suffix(kind)
    }
}
