use std::io::{self, BufRead, Write};

/// Print `question`, read one line, and fall back to `default` on an empty
/// answer or end of input.
pub fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: &str,
) -> io::Result<String> {
    write!(output, "{question}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    })
}

/// Yes/no question; anything other than `y`/`yes` (any case) is no, and an
/// empty answer takes `default`.
pub fn confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: bool,
) -> io::Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let answer = ask(input, output, &format!("{question} {hint} "), "")?;
    if answer.is_empty() {
        return Ok(default);
    }
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_answer_uses_default() {
        let mut out = Vec::new();
        let answer = ask(&mut "\n".as_bytes(), &mut out, "Root? ", ".").unwrap();
        assert_eq!(answer, ".");
        assert_eq!(String::from_utf8(out).unwrap(), "Root? ");

        let eof = ask(&mut "".as_bytes(), &mut Vec::new(), "Root? ", "output").unwrap();
        assert_eq!(eof, "output");
    }

    #[test]
    fn answer_is_trimmed() {
        let answer = ask(&mut "  /data/gis \n".as_bytes(), &mut Vec::new(), "Root? ", ".").unwrap();
        assert_eq!(answer, "/data/gis");
    }

    #[test]
    fn confirm_accepts_yes_variants() {
        let mut out = Vec::new();
        assert!(confirm(&mut "YES\n".as_bytes(), &mut out, "Apply?", false).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "Apply? [y/N] ");
        assert!(!confirm(&mut "nope\n".as_bytes(), &mut Vec::new(), "Apply?", true).unwrap());
        assert!(confirm(&mut "\n".as_bytes(), &mut Vec::new(), "Apply?", true).unwrap());
    }
}
