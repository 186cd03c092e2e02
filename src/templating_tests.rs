#[cfg(test)]
mod tests {
    use crate::templating::TemplateEngine;
    use std::fs;
    use tempfile::TempDir;

    async fn setup_test_templates() -> (TempDir, TemplateEngine) {
        let temp_dir = TempDir::new().unwrap();
        let template_path = temp_dir.path();
        fs::create_dir_all(template_path.join("pages")).unwrap();
        fs::create_dir_all(template_path.join("partials")).unwrap();

        let header_content = r#"<!DOCTYPE html>
<html>
<head>
    <title>{% if page_title %}{{ page_title }} - {% endif %}Test Board</title>
</head>
<body>
    <main>"#;
        fs::write(
            template_path.join("partials/_header.html.liquid"),
            header_content,
        )
        .unwrap();

        let footer_content = r#"    </main>
    <footer><p>&copy; {{ current_year }} Test Board</p></footer>
</body>
</html>"#;
        fs::write(
            template_path.join("partials/_footer.html.liquid"),
            footer_content,
        )
        .unwrap();

        let list_content = r#"{% assign page_title = "Posts" %}
{% include "_header.html.liquid" %}
<ul>
{% for post in posts %}
    <li>{{ post.title | escape }} ({{ post.comment_count }})</li>
{% endfor %}
</ul>
{% include "_footer.html.liquid" %}"#;
        fs::write(template_path.join("pages/list.html.liquid"), list_content).unwrap();

        let engine = TemplateEngine::new(template_path.to_path_buf());
        (temp_dir, engine)
    }

    #[tokio::test]
    async fn test_render_with_partials() {
        let (_temp_dir, engine) = setup_test_templates().await;

        let globals = liquid::object!({
            "posts": [
                { "title": "First", "comment_count": 2 },
                { "title": "Second", "comment_count": 0 }
            ]
        });

        let html = engine
            .render_template("pages/list.html.liquid", globals)
            .await
            .unwrap();

        assert!(html.contains("<title>Posts - Test Board</title>"));
        assert!(html.contains("<li>First (2)</li>"));
        assert!(html.contains("<li>Second (0)</li>"));
        assert!(html.contains("</html>"));
    }

    #[tokio::test]
    async fn test_current_year_is_provided() {
        use chrono::Datelike;

        let (_temp_dir, engine) = setup_test_templates().await;
        let html = engine
            .render_template("pages/list.html.liquid", liquid::object!({ "posts": [] }))
            .await
            .unwrap();

        let year = chrono::Local::now().year().to_string();
        assert!(html.contains(&format!("&copy; {} Test Board", year)));
    }

    #[tokio::test]
    async fn test_user_text_is_escaped() {
        let (_temp_dir, engine) = setup_test_templates().await;

        let globals = liquid::object!({
            "posts": [{ "title": "<script>alert(1)</script>", "comment_count": 0 }]
        });

        let html = engine
            .render_template("pages/list.html.liquid", globals)
            .await
            .unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_missing_template_is_an_error() {
        let (_temp_dir, engine) = setup_test_templates().await;

        let result = engine
            .render_template("pages/missing.html.liquid", liquid::object!({}))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_template_changes_are_picked_up() {
        let (temp_dir, engine) = setup_test_templates().await;
        let page = temp_dir.path().join("pages/plain.html.liquid");

        fs::write(&page, "version one").unwrap();
        let first = engine
            .render_template("pages/plain.html.liquid", liquid::object!({}))
            .await
            .unwrap();
        assert_eq!(first, "version one");

        // Make sure the modification time moves forward
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        fs::write(&page, "version two").unwrap();

        let second = engine
            .render_template("pages/plain.html.liquid", liquid::object!({}))
            .await
            .unwrap();
        assert_eq!(second, "version two");
    }
}
