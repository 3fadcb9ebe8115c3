//! Escape-Grammatik des ServerQuery-Protokolls
//!
//! Leerzeichen trennen Parameter, `|` trennt Datensaetze. Beides und alle
//! Steuerzeichen muessen in Werten daher escaped werden:
//!
//! | Zeichen | Escape |
//! |---------|--------|
//! | `\`     | `\\`   |
//! | `/`     | `\/`   |
//! | Space   | `\s`   |
//! | `\|`    | `\p`   |
//! | BEL     | `\a`   |
//! | BS      | `\b`   |
//! | FF      | `\f`   |
//! | LF      | `\n`   |
//! | CR      | `\r`   |
//! | TAB     | `\t`   |
//! | VT      | `\v`   |

/// Kodiert einen Wert fuer die Ausgabe (Escape-Sequenzen einfuegen)
///
/// Jedes Zeichen wird genau einmal betrachtet, daher kann ein bereits
/// eingefuegter Backslash nicht erneut escaped werden. Enthaelt die Eingabe
/// schon Escape-Sequenzen, werden sie nicht erkannt: `a\sb` wird zu
/// `a\\sb` und kommt beim Server als `a\sb` an.
pub fn encode_value(s: &str) -> String {
    let mut result = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '/' => result.push_str("\\/"),
            ' ' => result.push_str("\\s"),
            '|' => result.push_str("\\p"),
            '\x07' => result.push_str("\\a"),
            '\x08' => result.push_str("\\b"),
            '\x0C' => result.push_str("\\f"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\x0B' => result.push_str("\\v"),
            other => result.push(other),
        }
    }

    result
}

/// Dekodiert Escape-Sequenzen in einem Wert-String
///
/// Unbekannte Sequenzen (`\x`) und ein einzelner Backslash am Ende bleiben
/// unveraendert stehen.
pub fn decode_value(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => result.push('\\'),
            Some('/') => result.push('/'),
            Some('s') => result.push(' '),
            Some('p') => result.push('|'),
            Some('a') => result.push('\x07'),
            Some('b') => result.push('\x08'),
            Some('f') => result.push('\x0C'),
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('v') => result.push('\x0B'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leerzeichen_und_pipe() {
        assert_eq!(encode_value("Mein Kanal|2"), r"Mein\sKanal\p2");
    }

    #[test]
    fn backslash_wird_nicht_doppelt_escaped() {
        // `\` zuerst: aus "\ " darf nicht "\\\\s" werden
        assert_eq!(encode_value("\\ "), r"\\\s");
        assert_eq!(decode_value(r"\\\s"), "\\ ");
    }

    #[test]
    fn alle_steuerzeichen() {
        let roh = "/\x07\x08\x0C\n\r\t\x0B";
        assert_eq!(encode_value(roh), r"\/\a\b\f\n\r\t\v");
        assert_eq!(decode_value(r"\/\a\b\f\n\r\t\v"), roh);
    }

    #[test]
    fn roundtrip_ueber_gesamtes_alphabet() {
        // Druckbares ASCII plus alle Steuerzeichen der Escape-Tabelle
        let mut alphabet: String = (0x20u8..0x7F).map(char::from).collect();
        alphabet.push_str("\x07\x08\x0C\n\r\t\x0B");

        assert_eq!(decode_value(&encode_value(&alphabet)), alphabet);

        // Jedes Zeichenpaar einzeln, damit Nachbarschaftseffekte auffallen
        let zeichen: Vec<char> = alphabet.chars().collect();
        for a in &zeichen {
            for b in &zeichen {
                let s: String = [*a, *b].iter().collect();
                assert_eq!(decode_value(&encode_value(&s)), s, "Paar {s:?}");
            }
        }
    }

    #[test]
    fn bereits_escapte_eingabe_wird_erneut_escaped() {
        assert_eq!(encode_value(r"a\sb"), r"a\\sb");
        assert_eq!(decode_value(&encode_value(r"a\sb")), r"a\sb");
    }

    #[test]
    fn unbekannte_sequenz_bleibt_stehen() {
        assert_eq!(decode_value(r"a\xb"), r"a\xb");
        assert_eq!(decode_value("ende\\"), "ende\\");
    }

    #[test]
    fn unicode_unveraendert() {
        assert_eq!(encode_value("Grüße"), "Grüße");
        assert_eq!(decode_value("Grüße"), "Grüße");
    }
}
