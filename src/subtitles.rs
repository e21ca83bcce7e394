use tracing::debug;

/// Convert a downloaded subtitle document to plain transcript text.
///
/// `format` is the track extension reported by yt-dlp (`vtt`, `srt`, ...).
/// Unknown formats are returned as-is; the track selector prefers VTT/SRT so
/// this is a rare last resort.
pub fn subtitle_to_text(content: &str, format: &str) -> String {
    match format {
        "vtt" => parse_vtt(content),
        "srt" => parse_srt(content),
        other => {
            debug!(format = other, "Unknown subtitle format, passing through raw");
            content.trim().to_string()
        }
    }
}

/// Extract plain text from a WebVTT document.
///
/// Formatting tags are stripped and consecutive duplicate lines are collapsed.
/// YouTube auto-captions repeat each line in a rolling window, so the collapse
/// is what keeps transcripts readable.
pub fn parse_vtt(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut collected: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();

        // Only timestamp lines start a cue; headers, notes and cue
        // identifiers fall through.
        if line.contains("-->") {
            i += 1;

            // YouTube VTT sometimes puts an empty line between the timestamp
            // and the cue text.
            while i < lines.len() && lines[i].trim().is_empty() {
                i += 1;
            }

            while i < lines.len() {
                let text_line = lines[i].trim();
                if text_line.is_empty() || text_line.contains("-->") {
                    break;
                }
                push_deduped(&mut collected, strip_tags(text_line));
                i += 1;
            }
        } else {
            i += 1;
        }
    }

    debug!(line_count = collected.len(), "Parsed VTT subtitle");
    collected.join(" ")
}

/// Extract plain text from an SRT document.
///
/// Same cleanup as [`parse_vtt`]: tags stripped, consecutive duplicates
/// collapsed.
pub fn parse_srt(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut collected: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();

        if line.contains("-->") {
            i += 1;
            while i < lines.len() {
                let text_line = lines[i].trim();
                // A blank line, a bare sequence number or the next timestamp
                // ends the cue.
                if text_line.is_empty()
                    || text_line.contains("-->")
                    || text_line.chars().all(|c| c.is_ascii_digit())
                {
                    break;
                }
                push_deduped(&mut collected, strip_tags(text_line));
                i += 1;
            }
        } else {
            i += 1;
        }
    }

    debug!(line_count = collected.len(), "Parsed SRT subtitle");
    collected.join(" ")
}

/// Append `text` unless it is empty or repeats the previously collected line.
fn push_deduped(collected: &mut Vec<String>, text: String) {
    if text.is_empty() {
        return;
    }
    if collected.last().map(String::as_str) == Some(text.as_str()) {
        return;
    }
    collected.push(text);
}

/// Remove markup tags like `<c>`, `<v Speaker>`, `<i>`, `<00:00:01.040>`.
fn strip_tags(text: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    result.trim().to_string()
}
