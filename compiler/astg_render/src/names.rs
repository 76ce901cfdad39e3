//! Identifier casing for generated Go code and file names.

/// Lower the leading capital run of an identifier: `GetUser` → `getUser`,
/// `HTTPServer` → `httpServer`, `ID` → `id`.
pub fn lower_camel(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let run = chars.iter().take_while(|c| c.is_uppercase()).count();
    let lower_upto = match run {
        0 => return name.to_string(),
        n if n == chars.len() => n,
        1 => 1,
        // Keep the capital that starts the next word.
        n if chars[n].is_lowercase() => n - 1,
        n => n,
    };
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < lower_upto { c.to_ascii_lowercase() } else { *c })
        .collect()
}

/// Capitalize the first letter: `id` → `Id`.
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A valid Go package identifier derived from a directory name.
pub fn package_ident(dir: &str) -> String {
    let ident: String = dir
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    match ident.chars().next() {
        None => "client".to_string(),
        Some(c) if c.is_ascii_digit() => format!("client{ident}"),
        Some(_) => ident,
    }
}

/// File-name stem of a contract: `UserService` → `userservice`.
pub fn file_stem(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// JSON-RPC method name: `"<contract>.<method>"`, both lower camel.
pub fn rpc_method(contract: &str, method: &str) -> String {
    format!("{}.{}", lower_camel(contract), lower_camel(method))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lower_camel_cases() {
        assert_eq!(lower_camel("Pinger"), "pinger");
        assert_eq!(lower_camel("GetUser"), "getUser");
        assert_eq!(lower_camel("HTTPServer"), "httpServer");
        assert_eq!(lower_camel("ID"), "id");
        assert_eq!(lower_camel("already"), "already");
        assert_eq!(lower_camel(""), "");
    }

    #[test]
    fn rpc_names() {
        assert_eq!(rpc_method("Pinger", "Ping"), "pinger.ping");
        assert_eq!(rpc_method("UserAPI", "ListAll"), "userAPI.listAll");
    }

    #[test]
    fn identifiers() {
        assert_eq!(upper_first("id"), "Id");
        assert_eq!(upper_first(""), "");
        assert_eq!(package_ident("my-client"), "myclient");
        assert_eq!(package_ident("2fa"), "client2fa");
        assert_eq!(package_ident("--"), "client");
        assert_eq!(file_stem("UserService"), "userservice");
    }
}
