//! Revised Romanization of Hangul syllables
//!
//! Each precomposed syllable (U+AC00..=U+D7A3) is split into its initial,
//! medial, and final jamo. A final consonant followed by a syllable with a
//! silent initial ㅇ is carried over as that syllable's initial sound
//! (떡볶이 → tteokbokki), and ㄹ meeting ㄹ is written `ll` (빨래 → ppallae).
//! Other sound-change rules are not applied.

const SYLLABLE_BASE: u32 = 0xAC00;
const SYLLABLE_LAST: u32 = 0xD7A3;
const MEDIALS_PER_INITIAL: u32 = 21 * 28;
const FINALS_PER_MEDIAL: u32 = 28;
const SILENT_INITIAL: usize = 11;
const RIEUL_INITIAL: usize = 5;
const RIEUL_FINAL: usize = 8;

const INITIALS: [&str; 19] = [
    "g", "kk", "n", "d", "tt", "r", "m", "b", "pp", "s", "ss", "", "j", "jj", "ch", "k", "t", "p",
    "h",
];

const MEDIALS: [&str; 21] = [
    "a", "ae", "ya", "yae", "eo", "e", "yeo", "ye", "o", "wa", "wae", "oe", "yo", "u", "wo", "we",
    "wi", "yu", "eu", "ui", "i",
];

const FINALS: [&str; 28] = [
    "", "k", "k", "k", "n", "n", "n", "t", "l", "k", "m", "l", "l", "l", "p", "l", "m", "p", "p",
    "t", "t", "ng", "t", "t", "k", "t", "p", "t",
];

/// Jamo decomposition of one precomposed syllable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Syllable {
    initial: usize,
    medial: usize,
    last: usize,
}

fn decompose(c: char) -> Option<Syllable> {
    let code = c as u32;
    if !(SYLLABLE_BASE..=SYLLABLE_LAST).contains(&code) {
        return None;
    }
    let offset = code - SYLLABLE_BASE;
    Some(Syllable {
        initial: (offset / MEDIALS_PER_INITIAL) as usize,
        medial: ((offset % MEDIALS_PER_INITIAL) / FINALS_PER_MEDIAL) as usize,
        last: (offset % FINALS_PER_MEDIAL) as usize,
    })
}

/// Initial consonant a simple final turns into when linked to a silent ㅇ
fn linked_initial(last: usize) -> Option<usize> {
    match last {
        1 => Some(0),   // ㄱ
        2 => Some(1),   // ㄲ
        4 => Some(2),   // ㄴ
        7 => Some(3),   // ㄷ
        8 => Some(5),   // ㄹ
        16 => Some(6),  // ㅁ
        17 => Some(7),  // ㅂ
        19 => Some(9),  // ㅅ
        20 => Some(10), // ㅆ
        22 => Some(12), // ㅈ
        23 => Some(14), // ㅊ
        24 => Some(15), // ㅋ
        25 => Some(16), // ㅌ
        26 => Some(17), // ㅍ
        _ => None,
    }
}

/// Romanizes every Hangul syllable in `text`, passing other characters through
pub fn romanize(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() * 2);
    let mut carried: Option<usize> = None;
    let mut previous_final = 0;

    for (i, &c) in chars.iter().enumerate() {
        let Some(syllable) = decompose(c) else {
            out.push(c);
            carried = None;
            previous_final = 0;
            continue;
        };

        match carried.take() {
            Some(initial) if syllable.initial == SILENT_INITIAL => out.push_str(INITIALS[initial]),
            _ if syllable.initial == RIEUL_INITIAL && previous_final == RIEUL_FINAL => {
                out.push('l')
            }
            _ => out.push_str(INITIALS[syllable.initial]),
        }
        previous_final = syllable.last;
        out.push_str(MEDIALS[syllable.medial]);

        let next_is_silent = chars
            .get(i + 1)
            .and_then(|&n| decompose(n))
            .is_some_and(|n| n.initial == SILENT_INITIAL);

        match linked_initial(syllable.last) {
            Some(initial) if next_is_silent => carried = Some(initial),
            _ => out.push_str(FINALS[syllable.last]),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose() {
        // 각 = ㄱ + ㅏ + ㄱ
        assert_eq!(
            decompose('각'),
            Some(Syllable {
                initial: 0,
                medial: 0,
                last: 1
            })
        );
        assert_eq!(decompose('a'), None);
    }

    #[test]
    fn test_simple_words() {
        assert_eq!(romanize("과자"), "gwaja");
        assert_eq!(romanize("라면"), "ramyeon");
        assert_eq!(romanize("김치"), "gimchi");
        assert_eq!(romanize("새우깡"), "saeukkang");
    }

    #[test]
    fn test_final_linked_into_silent_initial() {
        assert_eq!(romanize("떡볶이"), "tteokbokki");
        assert_eq!(romanize("얼음"), "eoreum");
    }

    #[test]
    fn test_rieul_before_rieul_is_ll() {
        assert_eq!(romanize("빨래"), "ppallae");
        assert_eq!(romanize("설렁탕"), "seolleongtang");
        // Only a ㄹ final triggers it
        assert_eq!(romanize("신라면"), "sinramyeon");
        assert_eq!(romanize("빨 래"), "ppal rae");
    }

    #[test]
    fn test_ng_final_is_not_linked() {
        assert_eq!(romanize("강아지"), "gangaji");
    }

    #[test]
    fn test_mixed_text_passes_through() {
        assert_eq!(romanize("비타민 C"), "bitamin C");
        assert_eq!(romanize("abc-123"), "abc-123");
    }
}
