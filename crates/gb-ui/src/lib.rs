use askama::Template;

/// Seconds the confirmation page waits before sending the visitor home.
pub const CONFIRMATION_REDIRECT_SECONDS: u32 = 5;

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate<'a> {
    pub title: &'a str,
    /// Where the form posts to
    pub action: &'a str,
}

#[derive(Template)]
#[template(path = "confirmation.html")]
pub struct ConfirmationTemplate<'a> {
    pub title: &'a str,
    pub home_url: &'a str,
    pub redirect_seconds: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_has_every_form_field() {
        let html = HomeTemplate { title: "Guestbook", action: "/" }.render().unwrap();
        for field in ["fname", "lname", "city", "state", "country", "message"] {
            assert!(html.contains(&format!("name=\"{field}\"")), "missing {field}");
        }
        assert!(html.contains("method=\"post\""));
    }

    #[test]
    fn test_confirmation_refreshes_home() {
        let html = ConfirmationTemplate {
            title: "Thank you",
            home_url: "/",
            redirect_seconds: CONFIRMATION_REDIRECT_SECONDS,
        }
        .render()
        .unwrap();
        assert!(html.contains("content=\"5; url=/\""));
    }
}
