//! Canonical URLs of blog resources, used as redirect targets.

use uuid::Uuid;

pub fn index() -> String {
    "/".to_string()
}

pub fn post_detail(post_id: Uuid) -> String {
    format!("/posts/{post_id}/")
}

pub fn profile(username: &str) -> String {
    format!("/profile/{username}/")
}

/// Login page that sends the user back to `next` afterwards. Slashes stay
/// readable; everything else outside the unreserved set is escaped.
pub fn login(next: &str) -> String {
    let next = urlencoding::encode(next).replace("%2F", "/");
    format!("/auth/login/?next={next}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_end_with_slash() {
        let id = Uuid::nil();
        assert_eq!(
            post_detail(id),
            "/posts/00000000-0000-0000-0000-000000000000/"
        );
        assert_eq!(profile("leo"), "/profile/leo/");
        assert_eq!(login("/posts/create/"), "/auth/login/?next=/posts/create/");
    }

    #[test]
    fn test_login_escapes_next() {
        assert_eq!(
            login("/posts/?page=2&x=1"),
            "/auth/login/?next=/posts/%3Fpage%3D2%26x%3D1"
        );
        assert_eq!(login("/profile/лев/"), "/auth/login/?next=/profile/%D0%BB%D0%B5%D0%B2/");
    }
}
