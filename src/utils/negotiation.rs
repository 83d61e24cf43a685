// Start of file: /src/utils/negotiation.rs

/*
    * Accept header negotiation against the fixed list of problem document
    * media types. Quality values follow RFC 9110 §12.5.1: every candidate
    * takes the quality of the most specific range that matches it, the
    * highest non-zero quality wins and ties go to the earlier candidate.
*/

use std::fmt;

// * Candidates in priority order. JSON before XML, problem types first.
pub const SUPPORTED_MEDIA_TYPES: [&str; 6] = [
    "application/problem+json",
    "application/json",
    "application/*+json",
    "application/problem+xml",
    "application/xml",
    "application/*+xml",
];

/// Representation chosen for a problem document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    /// Content type written on rendered responses.
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Json => "application/problem+json",
            Format::Xml => "application/problem+xml",
        }
    }

    fn from_media_type(media_type: &str) -> Self {
        if media_type.ends_with("json") {
            Format::Json
        } else {
            Format::Xml
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Json => "json",
            Format::Xml => "xml",
        })
    }
}

/// One media range of an Accept header.
#[derive(Debug, Clone, PartialEq)]
struct MediaRange {
    type_: String,
    subtype: String,
    quality: f32,
}

impl MediaRange {
    fn parse(part: &str) -> Option<Self> {
        let mut params = part.split(';');
        let (type_, subtype) = params.next()?.trim().split_once('/')?;
        let type_: String = type_.trim().to_ascii_lowercase();
        let subtype: String = subtype.trim().to_ascii_lowercase();

        if type_.is_empty() || subtype.is_empty() || (type_ == "*" && subtype != "*") {
            return None;
        }

        let quality: f32 = params
            .filter_map(|param| param.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("q"))
            .map(|(_, value)| {
                // ? Unparsable or non-finite weights count as the default
                value
                    .trim()
                    .parse::<f32>()
                    .ok()
                    .filter(|quality| quality.is_finite())
                    .map_or(1.0, |quality| quality.clamp(0.0, 1.0))
            })
            .unwrap_or(1.0);

        Some(Self { type_, subtype, quality })
    }

    /// How specifically this range matches `candidate`, or `None` if it does not.
    ///
    /// 0 = `*/*`, 1 = `type/*`, 2 = structured suffix wildcard, 3 = exact.
    fn specificity(&self, candidate: &str) -> Option<u8> {
        let (c_type, c_subtype) = candidate.split_once('/')?;

        if self.type_ == "*" {
            return Some(0);
        }
        if self.type_ != c_type {
            return None;
        }
        if self.subtype == "*" {
            return Some(1);
        }
        if self.subtype == c_subtype {
            return Some(3);
        }

        let range_suffix: Option<(&str, &str)> = self.subtype.rsplit_once('+');
        let candidate_suffix: Option<(&str, &str)> = c_subtype.rsplit_once('+');
        match (range_suffix, candidate_suffix) {
            (Some((r_name, r_suffix)), Some((c_name, c_suffix)))
                if r_suffix == c_suffix && (r_name == "*" || c_name == "*") =>
            {
                Some(2)
            }
            _ => None,
        }
    }
}

fn parse_accept(header: &str) -> Vec<MediaRange> {
    let ranges: Vec<MediaRange> = header
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(MediaRange::parse)
        .collect();

    if ranges.is_empty() && header.trim().is_empty() {
        // ? A missing or empty header accepts anything
        return vec![MediaRange { type_: "*".into(), subtype: "*".into(), quality: 1.0 }];
    }
    ranges
}

/// Returns the best supported media type for `accept`, if any.
pub fn negotiate_media_type(accept: &str) -> Option<&'static str> {
    let ranges: Vec<MediaRange> = parse_accept(accept);
    let mut best: Option<(&'static str, f32)> = None;

    for candidate in SUPPORTED_MEDIA_TYPES {
        let quality: f32 = ranges
            .iter()
            .filter_map(|range| range.specificity(candidate).map(|score| (score, range.quality)))
            .max_by_key(|(score, _)| *score)
            .map(|(_, quality)| quality)
            .unwrap_or(0.0);

        if quality <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_quality)) if best_quality >= quality => {}
            _ => best = Some((candidate, quality)),
        }
    }

    best.map(|(media_type, _)| media_type)
}

/// Returns the format to render for `accept`, or `None` when neither JSON nor
/// XML is acceptable and the request should pass through untouched.
pub fn negotiate(accept: &str) -> Option<Format> {
    negotiate_media_type(accept).map(Format::from_media_type)
}

// End of file: /src/utils/negotiation.rs
