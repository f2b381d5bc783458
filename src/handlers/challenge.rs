//! The 401 page shown for self-destructing links opened without a password.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// "Authentication required" signal carrying the path the password form
/// should post back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub redirect: String,
}

impl Challenge {
    pub fn new(redirect: impl Into<String>) -> Self {
        Self {
            redirect: redirect.into(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            concat!(
                r#"<!doctype html><html><head><meta charset="utf-8">"#,
                r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
                r#"<title>Password required</title></head><body>"#,
                r#"<p>This file can only be opened once, and only with a password.</p>"#,
                r#"<form method="post" action="/{}">"#,
                r#"<label>Password <input type="password" name="password" autofocus required></label> "#,
                r#"<button type="submit">Open</button>"#,
                r#"</form></body></html>"#
            ),
            html_escape(&self.redirect)
        )
    }
}

impl IntoResponse for Challenge {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::UNAUTHORIZED, self.render()).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        response
    }
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_posts_back_to_requested_name() {
        let page = Challenge::new("AAECAwQF.txt").render();
        assert!(page.contains(r#"action="/AAECAwQF.txt""#));
        assert!(page.contains(r#"name="password""#));
    }

    #[test]
    fn redirect_is_escaped() {
        let page = Challenge::new(r#"x"><script>"#).render();
        assert!(!page.contains("<script>"));
        assert!(page.contains("&quot;&gt;&lt;script&gt;"));
    }

    #[test]
    fn responds_with_401_html() {
        let response = Challenge::new("AAECAwQF").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }
}
