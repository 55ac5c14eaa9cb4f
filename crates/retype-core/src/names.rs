/// Symbolic key names (X11 keysym spelling) for characters that are awkward
/// to write in the first column of a keymap line.
const SYMBOLIC_NAMES: &[(&str, char)] = &[
    ("exclam", '!'),
    ("at", '@'),
    ("numbersign", '#'),
    ("dollar", '$'),
    ("percent", '%'),
    ("asciicircum", '^'),
    ("ampersand", '&'),
    ("asterisk", '*'),
    ("parenleft", '('),
    ("parenright", ')'),
    ("minus", '-'),
    ("underscore", '_'),
    ("equal", '='),
    ("plus", '+'),
    ("bracketleft", '['),
    ("braceleft", '{'),
    ("bracketright", ']'),
    ("braceright", '}'),
    ("semicolon", ';'),
    ("colon", ':'),
    ("apostrophe", '\''),
    ("quotedbl", '"'),
    ("grave", '`'),
    ("asciitilde", '~'),
    ("backslash", '\\'),
    ("bar", '|'),
    ("comma", ','),
    ("less", '<'),
    ("period", '.'),
    ("greater", '>'),
    ("slash", '/'),
    ("question", '?'),
    ("space", ' '),
    ("Return", '\n'),
];

/// Translate a symbolic key name into the character it stands for.
///
/// Names are case-sensitive. Returns `None` for anything not in the table,
/// in which case the keymap line carrying it is dropped.
pub fn resolve(name: &str) -> Option<char> {
    SYMBOLIC_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, c)| c)
}

#[cfg(test)]
fn known_names() -> impl Iterator<Item = (&'static str, char)> {
    SYMBOLIC_NAMES.iter().copied()
}
