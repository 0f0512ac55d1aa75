pub(crate) fn is_valid_sql_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_idents() {
        assert!(is_valid_sql_ident("user"));
        assert!(is_valid_sql_ident("_role_1"));
    }

    #[test]
    fn invalid_idents() {
        assert!(!is_valid_sql_ident(""));
        assert!(!is_valid_sql_ident("1user"));
        assert!(!is_valid_sql_ident("user name"));
        assert!(!is_valid_sql_ident("public.user"));
    }
}
