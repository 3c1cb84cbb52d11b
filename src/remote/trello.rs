use anyhow::{Context, Result};
use async_trait::async_trait;

use super::BoardSide;
use crate::model::card::{Attachment, Card, CardComment, CardFields, Checklist};

const BASE_URL: &str = "https://api.trello.com/1";
const CARD_FIELDS: &str = "id,name,desc,due,idList";

pub struct TrelloClient {
    api_key: String,
    token: String,
    client: reqwest::Client,
}

impl TrelloClient {
    pub fn new(api_key: String, token: String) -> Self {
        Self {
            api_key,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn auth_params(&self) -> [(&str, &str); 2] {
        [("key", &self.api_key), ("token", &self.token)]
    }
}

#[async_trait]
impl BoardSide for TrelloClient {
    async fn list_changed(&self, board_id: &str, since: &str) -> Result<Vec<Card>> {
        let cards = self
            .client
            .get(format!("{BASE_URL}/boards/{board_id}/cards"))
            .query(&self.auth_params())
            .query(&[("since", since), ("fields", CARD_FIELDS)])
            .send()
            .await
            .context("Trello list cards failed")?
            .error_for_status()
            .context("Trello list cards rejected")?
            .json()
            .await
            .context("Failed to parse Trello cards")?;
        Ok(cards)
    }

    async fn get_checklists(&self, card_id: &str) -> Result<Vec<Checklist>> {
        let checklists = self
            .client
            .get(format!("{BASE_URL}/cards/{card_id}/checklists"))
            .query(&self.auth_params())
            .send()
            .await
            .context("Trello checklists failed")?
            .error_for_status()
            .context("Trello checklists rejected")?
            .json()
            .await
            .context("Failed to parse Trello checklists")?;
        Ok(checklists)
    }

    async fn get_comments(&self, card_id: &str) -> Result<Vec<CardComment>> {
        let comments = self
            .client
            .get(format!("{BASE_URL}/cards/{card_id}/actions"))
            .query(&self.auth_params())
            .query(&[("filter", "commentCard")])
            .send()
            .await
            .context("Trello comments failed")?
            .error_for_status()
            .context("Trello comments rejected")?
            .json()
            .await
            .context("Failed to parse Trello comments")?;
        Ok(comments)
    }

    async fn get_attachments(&self, card_id: &str) -> Result<Vec<Attachment>> {
        let attachments = self
            .client
            .get(format!("{BASE_URL}/cards/{card_id}/attachments"))
            .query(&self.auth_params())
            .send()
            .await
            .context("Trello attachments failed")?
            .error_for_status()
            .context("Trello attachments rejected")?
            .json()
            .await
            .context("Failed to parse Trello attachments")?;
        Ok(attachments)
    }

    async fn create_card(&self, list_id: &str, fields: &CardFields) -> Result<Card> {
        let card = self
            .client
            .post(format!("{BASE_URL}/cards"))
            .query(&self.auth_params())
            .query(&[("idList", list_id)])
            .json(fields)
            .send()
            .await
            .context("Trello create card failed")?
            .error_for_status()
            .context("Trello create card rejected")?
            .json()
            .await
            .context("Failed to parse created Trello card")?;
        Ok(card)
    }

    async fn update_card(&self, card_id: &str, fields: &CardFields) -> Result<Card> {
        let card = self
            .client
            .put(format!("{BASE_URL}/cards/{card_id}"))
            .query(&self.auth_params())
            .json(fields)
            .send()
            .await
            .context("Trello update card failed")?
            .error_for_status()
            .context("Trello update card rejected")?
            .json()
            .await
            .context("Failed to parse updated Trello card")?;
        Ok(card)
    }

    async fn add_comment(&self, card_id: &str, text: &str) -> Result<CardComment> {
        let comment = self
            .client
            .post(format!("{BASE_URL}/cards/{card_id}/actions/comments"))
            .query(&self.auth_params())
            .query(&[("text", text)])
            .send()
            .await
            .context("Trello add comment failed")?
            .error_for_status()
            .context("Trello add comment rejected")?
            .json()
            .await
            .context("Failed to parse Trello comment")?;
        Ok(comment)
    }
}
