//! Tempo annotations embedded in file names, such as `Drum Loop - 174 BPM.wav`.

use cadence_domain::Bpm;

const MARKER: [char; 3] = ['b', 'p', 'm'];

/// May sit between the value and the marker, or right after the marker.
fn is_bridge(c: char) -> bool {
    matches!(c, ' ' | '-' | '_' | '.')
}

/// May sit directly left of the value.
fn is_word_boundary(c: char) -> bool {
    !c.is_alphanumeric()
}

fn marker_at(chars: &[char], index: usize) -> bool {
    chars.len() >= index + MARKER.len()
        && chars[index..index + MARKER.len()]
            .iter()
            .zip(MARKER)
            .all(|(c, m)| c.to_ascii_lowercase() == m)
}

/// Value of a digit run, or `None` if it cannot be a tempo.
fn parse_value(digits: &[char]) -> Option<Bpm> {
    let significant: String = digits.iter().skip_while(|c| **c == '0').collect();
    // Anything longer than three significant digits is out of range anyway.
    if significant.len() > 3 {
        return None;
    }
    let value: u32 = if significant.is_empty() {
        0
    } else {
        significant.parse().ok()?
    };
    Bpm::new(f64::from(value))
}

/// Extracts a tempo annotated as `<value>[sep]BPM` from a file name or path.
///
/// The leftmost well-formed candidate with a value in `[30, 300]` wins.
pub fn bpm_from_filename(filename: &str) -> Option<Bpm> {
    let chars: Vec<char> = filename.chars().collect();
    (0..chars.len())
        .filter(|&index| marker_at(&chars, index))
        .find_map(|index| candidate_before_marker(&chars, index))
}

fn candidate_before_marker(chars: &[char], marker: usize) -> Option<Bpm> {
    if let Some(&next) = chars.get(marker + MARKER.len()) {
        if !is_bridge(next) {
            return None;
        }
    }
    let mut end = marker;
    if end > 0 && is_bridge(chars[end - 1]) {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && chars[start - 1].is_ascii_digit() {
        start -= 1;
    }
    if start == end {
        return None;
    }
    if start > 0 && !is_word_boundary(chars[start - 1]) {
        return None;
    }
    parse_value(&chars[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bpm(filename: &str) -> Option<f64> {
        bpm_from_filename(filename).map(Bpm::get)
    }

    #[test]
    fn known_filenames() {
        let cases: &[(&str, Option<f64>)] = &[
            ("120 BPM", Some(120.0)),
            ("120 BPM.opus", Some(120.0)),
            ("C:/my\\path/to\\120 BPM", Some(120.0)),
            ("1 BPM", None),
            ("29 BPM", None),
            ("30 BPM", Some(30.0)),
            ("300 BPM", Some(300.0)),
            ("301 BPM", None),
            ("1000 BPM", None),
            ("000120 BPM", Some(120.0)),
            ("anything 120 BPM", Some(120.0)),
            ("anything120 BPM", None),
            ("120 BPM anything", Some(120.0)),
            ("120 BPManything", None),
            ("anything-120-BPM", Some(120.0)),
            ("anything_120_BPM", Some(120.0)),
            ("anything.120.BPM", Some(120.0)),
            ("120/BPM", None),
            ("120\\BPM", None),
            ("120:BPM", None),
            ("120;BPM", None),
            ("120'BPM", None),
            ("anything_120-BPM", Some(120.0)),
            ("anything.120BPM", Some(120.0)),
            ("Cymatics - Cyclone Top Drum Loop 3 - 174 BPM", Some(174.0)),
            ("Fantasie Impromptu Op. 66.mp3", None),
        ];
        for (filename, expected) in cases {
            assert_eq!(bpm(filename), *expected, "{filename}");
        }
    }

    #[test]
    fn whole_valid_range_parses() {
        for value in 30..=300 {
            assert_eq!(bpm(&format!("{value} BPM")), Some(f64::from(value)));
        }
        for value in (1..30).chain(301..=1000) {
            assert_eq!(bpm(&format!("{value} BPM")), None, "{value}");
        }
    }

    #[test]
    fn separators_combine_freely() {
        for before in [' ', '-', '_', '.'] {
            for after in [' ', '-', '_', '.'] {
                let name = format!("loop{before}96{after}bpm{after}v2.wav");
                assert_eq!(bpm(&name), Some(96.0), "{name}");
            }
        }
    }

    #[test]
    fn reserved_characters_break_the_match() {
        for reserved in ['/', '\\', ':', ';', '\''] {
            assert_eq!(bpm(&format!("loop 96{reserved}BPM")), None);
            assert_eq!(bpm(&format!("loop 96 BPM{reserved}v2")), None);
        }
    }

    #[test]
    fn marker_is_case_insensitive() {
        assert_eq!(bpm("loop_90bpm.wav"), Some(90.0));
        assert_eq!(bpm("loop_90BpM.wav"), Some(90.0));
    }

    #[test]
    fn leftmost_valid_candidate_wins() {
        assert_eq!(bpm("85 BPM to 170 BPM"), Some(85.0));
        assert_eq!(bpm("999 BPM then 140 BPM"), Some(140.0));
        assert_eq!(bpm("x120 BPM then 140 BPM"), Some(140.0));
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(bpm(""), None);
        assert_eq!(bpm("BPM"), None);
        assert_eq!(bpm(" BPM"), None);
        assert_eq!(bpm("000 BPM"), None);
        assert_eq!(bpm("99999999999999999999999 BPM"), None);
        assert_eq!(bpm("(120 BPM)"), None);
        assert_eq!(bpm("[120 BPM"), Some(120.0));
        assert_eq!(bpm("café 128 BPM"), Some(128.0));
        assert_eq!(bpm("é128 BPM"), None);
        assert_eq!(bpm("my/path\\foo_-_100BPM_Sticks_-_foo.wav"), Some(100.0));
    }
}
