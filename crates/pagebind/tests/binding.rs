//! Binding behaviour of derived page objects against the mock driver.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pagebind::mock::{MockDriver, MockElement};
use pagebind::{
    classify, Block, BlockList, Button, By, CheckBox, ElementBinder, ElementList, FieldCategory,
    PageError, PageObject, ReadinessMark, SearchContext, ShapeTraits, SkipReason, TextBlock,
    TextInput, TypifiedElement, TypifiedList, WebElement,
};
use std::time::Duration;

#[derive(Debug, Default, PageObject)]
#[page(name = "Search", url = "https://example.test/search")]
struct SearchPage {
    #[page(visible, any(id = "q", chain(css = "form.search", name = "q")), label = "query box")]
    query: TextInput,
    #[page(css = "li.result", timeout_secs = 30)]
    results: ElementList,
    #[page(css = "li.result a")]
    links: TypifiedList<Button>,
    #[page(id = "remember")]
    remember: CheckBox,
    #[page(force_visible, id = "banner")]
    banner: WebElement,
    #[page(visible)]
    unlocated: Button,
    notes: String,
}

#[derive(Debug, Default, PageObject)]
struct Card {
    #[page(root)]
    root: WebElement,
    #[page(visible, css = ".title")]
    title: TextBlock,
}

#[derive(Debug, Default, PageObject)]
struct Dashboard {
    #[page(visible, css = ".card")]
    featured: Block<Card>,
    #[page(css = ".card")]
    cards: BlockList<Card>,
}

fn bind<P: PageObject>(driver: &MockDriver) -> (P, pagebind::BindReport) {
    let mut page = P::default();
    let report = ElementBinder::new(driver.shared()).bind(&mut page, &SearchContext::Document);
    (page, report)
}

mod schema_tests {
    use super::*;

    #[test]
    fn test_schema_follows_declaration_order() {
        let names: Vec<String> = SearchPage::schema()
            .iter()
            .map(|spec| spec.field_name().to_string())
            .collect();
        assert_eq!(
            names,
            ["query", "results", "links", "remember", "banner", "unlocated", "notes"]
        );
    }

    #[test]
    fn test_field_metadata() {
        let schema = SearchPage::schema();
        assert_eq!(schema[0].label(), "query box");
        assert_eq!(schema[0].mark(), Some(ReadinessMark::Visible));
        assert_eq!(schema[0].category(), FieldCategory::TypifiedElement);
        assert_eq!(schema[1].timeout_override(), Some(Duration::from_secs(30)));
        assert_eq!(schema[1].category(), FieldCategory::ElementList);
        assert_eq!(schema[2].category(), FieldCategory::TypifiedElementList);
        assert_eq!(schema[4].mark(), Some(ReadinessMark::ForceVisible));
        assert_eq!(schema[4].category(), FieldCategory::SingleElement);
        assert_eq!(schema[6].category(), FieldCategory::Unrecognized);
    }

    #[test]
    fn test_page_metadata() {
        assert_eq!(SearchPage::page_name(), "Search");
        assert_eq!(SearchPage::default_url(), Some("https://example.test/search"));
        assert_eq!(Card::page_name(), "Card");
        assert_eq!(Card::default_url(), None);
    }

    #[test]
    fn test_block_root_is_wrapped() {
        let schema = Card::schema();
        assert!(schema[0].is_wrapped_root());
        assert!(!schema[1].is_wrapped_root());

        let dashboard = Dashboard::schema();
        assert_eq!(dashboard[0].category(), FieldCategory::CompositeBlock);
        assert_eq!(dashboard[1].category(), FieldCategory::CompositeBlockList);
    }

    #[test]
    fn test_typed_list_shape_classifies_as_typed_element() {
        let shape = ShapeTraits {
            typified: true,
            list: true,
            ..ShapeTraits::NONE
        };
        assert_eq!(classify(shape), FieldCategory::TypifiedElement);
    }
}

mod bind_tests {
    use super::*;

    #[test]
    fn test_binding_does_not_touch_the_driver() {
        let driver = MockDriver::new();
        let (page, report) = bind::<SearchPage>(&driver);

        assert_eq!(driver.find_calls(), 0);
        assert!(report.is_bound("query"));
        assert!(report.is_bound("results"));
        assert!(report.is_bound("links"));
        assert!(page.query.wrapped().is_bound());
    }

    #[test]
    fn test_unusable_fields_are_skipped() {
        let driver = MockDriver::new();
        let (page, report) = bind::<SearchPage>(&driver);

        assert!(matches!(report.skip_reason("notes"), Some(SkipReason::Unrecognized)));
        assert!(matches!(report.skip_reason("unlocated"), Some(SkipReason::NoLocator)));
        assert!(!page.unlocated.wrapped().is_bound());
        assert!(page.notes.is_empty());
    }

    #[test]
    fn test_each_call_resolves_again() {
        let driver = MockDriver::new();
        driver.insert(MockElement::new("msg").matching(By::css("li.result")).text("first"));
        let (page, _) = bind::<SearchPage>(&driver);

        assert_eq!(page.results.texts().unwrap(), ["first"]);
        driver.replace(
            "msg",
            MockElement::new("msg2").matching(By::css("li.result")).text("second"),
        );
        assert_eq!(page.results.texts().unwrap(), ["second"]);
    }

    #[test]
    fn test_missing_element_surfaces_on_use() {
        let driver = MockDriver::new();
        let (page, _) = bind::<SearchPage>(&driver);

        let err = page.remember.is_checked().unwrap_err();
        assert!(matches!(err, PageError::ElementNotFound { ref name, .. } if name == "remember"));
    }

    #[test]
    fn test_any_takes_first_matching_alternative() {
        let driver = MockDriver::new();
        driver.insert(MockElement::new("form").matching(By::css("form.search")));
        driver.insert(
            MockElement::new("inner-q")
                .matching(By::name("q"))
                .child_of("form")
                .tag("input"),
        );
        let (page, _) = bind::<SearchPage>(&driver);

        page.query.enter("rust").unwrap();
        assert_eq!(driver.attribute_of("inner-q", "value").as_deref(), Some("rust"));

        driver.insert(MockElement::new("q").tag("input"));
        page.query.enter("again").unwrap();
        assert_eq!(driver.attribute_of("q", "value").as_deref(), Some("again"));
        assert_eq!(driver.attribute_of("inner-q", "value").as_deref(), Some("rust"));
    }

    #[test]
    fn test_chain_narrows_within_parent() {
        let driver = MockDriver::new();
        driver.insert(MockElement::new("other-q").matching(By::name("q")));
        let (page, _) = bind::<SearchPage>(&driver);
        assert!(!page.query.is_present().unwrap());

        driver.insert(MockElement::new("form").matching(By::css("form.search")));
        driver.insert(MockElement::new("inner-q").matching(By::name("q")).child_of("form"));
        assert!(page.query.is_present().unwrap());
    }

    #[test]
    fn test_typed_list_items() {
        let driver = MockDriver::new();
        for i in 0..3 {
            driver.insert(
                MockElement::new(format!("link{i}"))
                    .matching(By::css("li.result a"))
                    .text(format!("Result {i}")),
            );
        }
        let (page, _) = bind::<SearchPage>(&driver);

        assert_eq!(page.links.len().unwrap(), 3);
        page.links.items().unwrap()[2].click().unwrap();
        assert_eq!(driver.clicks(), ["link2"]);
        assert_eq!(
            page.links.display_values().unwrap(),
            ["Result 0", "Result 1", "Result 2"]
        );
    }

    #[test]
    fn test_checkbox_toggles_only_when_needed() {
        let driver = MockDriver::new();
        driver.insert(
            MockElement::new("remember")
                .tag("input")
                .attr("type", "checkbox"),
        );
        let (page, _) = bind::<SearchPage>(&driver);

        page.remember.select().unwrap();
        page.remember.select().unwrap();
        assert!(page.remember.is_checked().unwrap());
        assert_eq!(driver.clicks().len(), 1);
        assert_eq!(page.remember.display_value().unwrap(), "checked");
    }
}

mod block_tests {
    use super::*;

    fn cards(driver: &MockDriver) {
        for i in 0..2 {
            driver.insert(MockElement::new(format!("card{i}")).matching(By::css(".card")));
            driver.insert(
                MockElement::new(format!("title{i}"))
                    .matching(By::css(".title"))
                    .child_of(format!("card{i}"))
                    .text(format!(" Card {i} ")),
            );
        }
    }

    #[test]
    fn test_block_fields_resolve_within_root() {
        let driver = MockDriver::new();
        cards(&driver);
        let (page, _) = bind::<Dashboard>(&driver);

        let card = page.featured.get().unwrap();
        assert_eq!(card.title.display_value().unwrap(), "Card 0");
        assert_eq!(card.root.name(), "featured");
        assert!(card.root.is_present().unwrap());
    }

    #[test]
    fn test_block_list_binds_every_root() {
        let driver = MockDriver::new();
        cards(&driver);
        let (page, _) = bind::<Dashboard>(&driver);

        let titles: Vec<String> = page
            .cards
            .blocks()
            .unwrap()
            .iter()
            .map(|card| card.title.display_value().unwrap())
            .collect();
        assert_eq!(titles, ["Card 0", "Card 1"]);
    }

    #[test]
    fn test_block_without_root_fails_on_use() {
        let driver = MockDriver::new();
        let (page, _) = bind::<Dashboard>(&driver);
        assert!(matches!(
            page.featured.get(),
            Err(PageError::ElementNotFound { .. })
        ));
        assert!(page.cards.is_empty().unwrap());
    }
}
