use crate::adapters::http::ensure_success;
use crate::core::html;
use crate::core::menu::{find_menu_day, MenuLayout};
use crate::domain::model::{MenuDate, MenuDay};
use crate::domain::ports::MenuSource;
use crate::utils::error::{LunchError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Scrapes the cafeteria page for one day's lunch.
pub struct HttpMenuSource {
    client: Client,
    url: String,
    layout: MenuLayout,
}

impl HttpMenuSource {
    pub fn new(client: Client, url: impl Into<String>, layout: MenuLayout) -> Self {
        Self {
            client,
            url: url.into(),
            layout,
        }
    }

    /// Text of every selected day block on the page.
    pub fn block_texts(&self, page: &str) -> Vec<String> {
        html::select_div_blocks(page, &self.layout.container_class, &self.layout.block_class)
            .into_iter()
            .map(html::to_text)
            .filter(|text| !text.is_empty())
            .collect()
    }
}

#[async_trait]
impl MenuSource for HttpMenuSource {
    async fn fetch_menu(&self, date: &MenuDate) -> Result<MenuDay> {
        tracing::debug!("Making menu request to: {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        tracing::debug!("Menu response status: {}", response.status());

        let page = ensure_success("menu page", response).await?.text().await?;
        let texts = self.block_texts(&page);
        tracing::debug!("Found {} menu block(s)", texts.len());

        find_menu_day(&texts, date, &self.layout).ok_or_else(|| {
            LunchError::not_found(format!("lunch for {} not found on {}", date.label(), self.url))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use httpmock::prelude::*;

    const PAGE: &str = r#"<html><body>
        <div class="nav"><div class="divider">Donnerstag, 20. Juli – Mittag: Falsch Dessert: Nein</div></div>
        <div class="block">
          <div class="divider">
            <p><strong>Mittwoch, 19. Juli</strong></p><p>Mittag: Linsensuppe</p><p>Dessert: Pudding</p>
            &ndash;
            <p><strong>Donnerstag, 20. Juli</strong></p><p>Mittag: B&ograve; Kho</p><p>Dessert: Obst</p>
          </div>
        </div>
    </body></html>"#;

    fn thursday() -> MenuDate {
        MenuDate::from_date(NaiveDate::from_ymd_opt(2023, 7, 20).unwrap())
    }

    #[tokio::test]
    async fn test_fetch_menu_for_date() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET).path("/speiseplan");
            then.status(200)
                .header("Content-Type", "text/html; charset=utf-8")
                .body(PAGE);
        });

        let source = HttpMenuSource::new(Client::new(), server.url("/speiseplan"), MenuLayout::default());
        let day = source.fetch_menu(&thursday()).await.unwrap();

        page_mock.assert();
        assert_eq!(day.lunch, "Bò Kho");
        assert_eq!(day.label, "Donnerstag, 20. Juli");
    }

    #[tokio::test]
    async fn test_fetch_menu_missing_day_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/speiseplan");
            then.status(200).body(PAGE);
        });

        let source = HttpMenuSource::new(Client::new(), server.url("/speiseplan"), MenuLayout::default());
        let friday = MenuDate::from_date(NaiveDate::from_ymd_opt(2023, 7, 21).unwrap());
        let err = source.fetch_menu(&friday).await.unwrap_err();

        assert!(matches!(err, LunchError::NotFoundError { .. }));
    }

    #[tokio::test]
    async fn test_fetch_menu_server_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/speiseplan");
            then.status(503);
        });

        let source = HttpMenuSource::new(Client::new(), server.url("/speiseplan"), MenuLayout::default());
        let err = source.fetch_menu(&thursday()).await.unwrap_err();

        assert!(matches!(err, LunchError::ApiResponseError { status: 503, .. }));
    }

    #[test]
    fn test_block_texts_only_inside_container() {
        let source = HttpMenuSource::new(Client::new(), "http://localhost", MenuLayout::default());
        let texts = source.block_texts(PAGE);

        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Mittwoch, 19. Juli"));
        assert!(texts[0].contains("– Donnerstag, 20. Juli Mittag: Bò Kho Dessert: Obst"));
    }
}
