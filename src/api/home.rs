use axum::response::Html;

const HOME_PAGE: &str = include_str!("../../assets/solar.html");

pub fn render_home_page() -> Html<&'static str> {
    Html(HOME_PAGE)
}

/// GET / - Static forecast page
pub async fn home() -> Html<&'static str> {
    render_home_page()
}
