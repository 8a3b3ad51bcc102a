/// Split one CSV line into fields.
///
/// A `"` toggles quoted mode and is dropped from the output; commas inside a
/// quoted region are kept as field content. There is no escape for a literal
/// quote. The trailing field is always pushed, so an empty line gives `[""]`.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
