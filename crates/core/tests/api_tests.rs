//! Library API integration tests
use pagemark_core::*;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

fn fixed_clock() -> chrono::NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2025, 3, 14).unwrap().and_hms_opt(9, 26, 0).unwrap()
}

fn pipeline() -> Pipeline {
    Pipeline::with_config(PipelineConfig::builder().clock(fixed_clock).build())
}

fn markdown_of(result: PipelineResult) -> String {
    match result {
        PipelineResult::Success { markdown, .. } => markdown,
        PipelineResult::Failure { message } => panic!("extraction failed: {message}"),
    }
}

#[test]
fn test_extract_api() {
    let html = "<html><head><title>Test</title></head>\
                <body><article><h1>Test</h1><p>Hello <b>  world  </b>.</p></article></body></html>";
    let result = extract(html, Some("https://www.example.com/post"), &PageOptions { include_images: false });

    let PipelineResult::Success { markdown, title, url } = result else {
        panic!("expected success");
    };
    assert_eq!(title, "Test");
    assert_eq!(url, "https://www.example.com/post");
    assert!(markdown.starts_with("# Test\n\n**Source:** https://www.example.com/post\n**Site:** example.com\n**Extracted:** "));
    assert!(markdown.ends_with("\n---\n\n# Test\n\nHello **world**."));
}

#[test]
fn test_blog_article_header() {
    let html = read_fixture("blog_article.html");
    let markdown = markdown_of(pipeline().run_html(&html, Some("https://blog.example.com/ownership"), &PageOptions::default()));

    assert!(markdown.starts_with(
        "# Understanding Ownership\n\n\
         **Source:** https://blog.example.com/ownership\n\
         **Site:** The Systems Blog\n\
         **Author:** Grace Hopper\n\
         **Section:** Programming\n\
         **Extracted:** 2025-03-14 at 09:26\n\n---\n\n"
    ));
}

#[test]
fn test_blog_article_body() {
    let html = read_fixture("blog_article.html");
    let markdown = markdown_of(pipeline().run_html(&html, Some("https://blog.example.com/ownership"), &PageOptions::default()));

    assert!(markdown.contains("single **owner**, and"));
    assert!(markdown.contains("## The rules"));
    assert!(markdown.contains("3. Each value has an owner.\n4. There can only be one owner at a time.\n5. When"));
    assert!(markdown.contains("```rust\nlet s = String::from(\"hello\");\nlet t = s;\n```"));
    assert!(markdown.contains("[the book](https://doc.rust-lang.org/book/)"));

    assert!(!markdown.contains("window.analytics"));
    assert!(!markdown.contains("Tracking pixel"));
    assert!(!markdown.contains("Sponsored"));
    assert!(!markdown.contains("Archive"));
    assert!(!markdown.contains("Copyright"));
    assert!(!markdown.contains("[]("));
    assert!(!markdown.contains("****"));
}

#[test]
fn test_cdn_image_recovered() {
    let html = read_fixture("blog_article.html");

    let with_images = markdown_of(pipeline().run_html(&html, None, &PageOptions { include_images: true }));
    assert!(with_images.contains("![Ownership diagram](https://images.example.org/owner%20ship.png)"));

    let without_images = markdown_of(pipeline().run_html(&html, None, &PageOptions { include_images: false }));
    assert!(!without_images.contains("!["));
    assert!(!without_images.contains("images.example.org"));
}

#[test]
fn test_site_rules_applied() {
    let html = read_fixture("substack_post.html");
    let result = pipeline().run_html(&html, Some("https://shipper.substack.com/p/notes"), &PageOptions::default());
    let markdown = markdown_of(result);

    assert!(markdown.starts_with("# Notes on Shipping\n\n"));
    assert!(markdown.contains("**Site:** shipper.substack.com\n**Author:** @shipper\n"));
    assert!(markdown.contains("Shipping small changes often beats"));
    assert!(markdown.contains("**Feedback** arrives"));
    assert!(!markdown.contains("Thanks for reading"));
    assert!(!markdown.contains("Share"));
    assert!(!markdown.contains("gardening"));
}

#[test]
fn test_small_generic_candidate_skipped() {
    let html = read_fixture("link_farm.html");
    let doc = Document::parse(&html).unwrap();

    let located = locate_content(&doc, None, &LocatorConfig::default()).unwrap();
    assert_eq!(located.source, ContentSource::Body);

    let markdown = markdown_of(pipeline().run(&doc, &PageOptions::default()));
    assert!(markdown.contains("This teaser is longer"));
    assert!(markdown.contains("Entry four closes the listing"));
}

#[test]
fn test_ratio_threshold_configurable() {
    let html = read_fixture("link_farm.html");
    let doc = Document::parse(&html).unwrap();
    let config = LocatorConfig { min_body_ratio: 0.1, ..Default::default() };

    let located = locate_content(&doc, None, &config).unwrap();
    assert_eq!(located.source, ContentSource::Generic("article".to_string()));
}

#[test]
fn test_user_site_table() {
    let user = SiteTable::from_json(
        r#"[{"host": "example.org", "content_selectors": [".story"], "remove_selectors": [".promo"]}]"#,
    )
    .unwrap();
    let sites = SiteTable::builtin().with_user_rules(user);
    let pipeline = Pipeline::with_config(PipelineConfig::builder().sites(sites).clock(fixed_clock).build());

    let html = format!(
        "<html><body><article><p>{}</p></article>\
         <div class=\"story\"><p>{}</p><div class=\"promo\">Buy now</div></div></body></html>",
        "Teaser. ".repeat(40),
        "The real story continues here with plenty of words. ".repeat(4)
    );
    let markdown = markdown_of(pipeline.run_html(&html, Some("https://news.example.org/a"), &PageOptions::default()));

    assert!(markdown.contains("The real story continues"));
    assert!(!markdown.contains("Teaser."));
    assert!(!markdown.contains("Buy now"));
}

#[test]
fn test_success_always_starts_with_heading() {
    let inputs = ["", "<p>x</p>", "<html><body></body></html>", "<div><span>only inline</span></div>"];
    for html in inputs {
        let markdown = markdown_of(pipeline().run_html(html, None, &PageOptions::default()));
        assert!(markdown.starts_with("# "), "input {html:?} produced {markdown:?}");
        assert_eq!(markdown, postprocess_markdown(&markdown));
    }
}

#[test]
fn test_postprocess_idempotent_on_output() {
    for name in ["blog_article.html", "substack_post.html", "link_farm.html"] {
        let html = read_fixture(name);
        let markdown = markdown_of(pipeline().run_html(&html, None, &PageOptions::default()));
        assert_eq!(postprocess_markdown(&markdown), markdown, "fixture {name}");
    }
}

#[test]
fn test_invalid_url_is_failure() {
    let result = extract("<p>x</p>", Some("not a url"), &PageOptions::default());
    assert!(!result.is_success());
    assert!(result.markdown().is_none());
}

#[test]
fn test_json_output() {
    let html = read_fixture("substack_post.html");
    let result = pipeline().run_html(&html, Some("https://shipper.substack.com/p/notes"), &PageOptions::default());
    let value: serde_json::Value = serde_json::from_str(&to_json(&result, false).unwrap()).unwrap();

    assert_eq!(value["status"], "ok");
    assert_eq!(value["title"], "Notes on Shipping");
    assert_eq!(value["url"], "https://shipper.substack.com/p/notes");
    assert!(value["markdown"].as_str().unwrap().starts_with("# Notes on Shipping"));
}

#[test]
fn test_custom_rule_overrides_defaults() {
    fn shout(content: &str, _: &scraper::ElementRef<'_>, _: &ConvertOptions) -> String {
        content.to_uppercase()
    }

    let converter = Converter::default().with_rule(Rule::replace("shout", Filter::Tags(&["em"]), shout));
    assert_eq!(converter.convert_html("<p>a <em>loud</em> word</p>"), "a LOUD word");
}

#[test]
fn test_suggested_filename() {
    assert_eq!(suggested_filename("Understanding Ownership"), "understanding-ownership.md");
}

#[test]
fn test_ordered_list_start() {
    let html = "<html><body><article><ol start=\"5\"><li>one</li><!-- gap --><li>two</li>\n<li>three</li></ol>\
                <p>Padding text so the article comfortably passes the minimum length check for candidates.</p>\
                </article></body></html>";
    let markdown = markdown_of(pipeline().run_html(html, None, &PageOptions::default()));

    assert!(markdown.contains("5. one\n6. two\n7. three"));
}

#[test]
fn test_cdn_image_target() {
    let html = "<html><body><p><img alt=\"a\" \
                src=\"https://cdn.example/image/fetch/w_200/https%3A%2F%2Fphotos.example.com%2Fa.jpg\"></p></body></html>";
    let markdown = markdown_of(pipeline().run_html(html, None, &PageOptions { include_images: true }));

    assert!(markdown.contains("![a](https://photos.example.com/a.jpg)"));
}

#[test]
fn test_script_and_hidden_excluded() {
    let html = "<html><body><article><p>Visible</p><script>var secret = 1;</script>\
                <div style=\"display:none\">Secret</div></article></body></html>";
    let markdown = markdown_of(pipeline().run_html(html, None, &PageOptions::default()));

    assert!(markdown.ends_with("Visible"));
    assert!(!markdown.contains("Secret"));
    assert!(!markdown.contains("secret"));
}

#[test]
fn test_extreme_ordered_list_start_succeeds() {
    let html = "<html><body><ol start=\"9223372036854775807\"><li>a</li><li>b</li></ol></body></html>";
    let markdown = markdown_of(pipeline().run_html(html, None, &PageOptions::default()));

    assert!(markdown.ends_with("9223372036854775807. a\n9223372036854775807. b"));
}

#[test]
fn test_postprocess_multi_pass_input_is_stable() {
    let input = format!("Intro {}{} done.[](#)Next", "[".repeat(10), "]()".repeat(10));
    let once = postprocess_markdown(&input);

    assert_eq!(once, "Intro  done.\n\nNext");
    assert_eq!(postprocess_markdown(&once), once);
}
