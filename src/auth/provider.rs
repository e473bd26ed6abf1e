use oauth2::{AuthUrl, Client, ClientId, ClientSecret, RedirectUrl, TokenUrl, basic::BasicClient};
use serde_json::Value;

use crate::{AppResult, GetField};

type OktaClient = Client<
    oauth2::StandardErrorResponse<oauth2::basic::BasicErrorResponseType>,
    oauth2::StandardTokenResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>,
    oauth2::StandardTokenIntrospectionResponse<
        oauth2::EmptyExtraTokenFields,
        oauth2::basic::BasicTokenType,
    >,
    oauth2::StandardRevocableToken,
    oauth2::StandardErrorResponse<oauth2::RevocationErrorResponseType>,
    oauth2::EndpointSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointSet,
>;

/// The Okta-style identity provider, built once at startup from
/// `client_secret.json`.
#[derive(Clone)]
pub struct Provider {
    userinfo_uri: String,
    client: OktaClient,
}

impl Provider {
    pub fn from_json(json: Value) -> AppResult<Provider> {
        let json = json.get_obj_field("okta")?;

        let client_id = ClientId::new(json.get_str_field("client_id")?);
        let client_secret = ClientSecret::new(json.get_str_field("client_secret")?);
        let auth_url = AuthUrl::new(json.get_str_field("auth_uri")?)?;
        let token_url = TokenUrl::new(json.get_str_field("token_uri")?)?;
        let redirect_url = RedirectUrl::new(json.get_str_field("redirect_uri")?)?;

        Ok(Provider {
            userinfo_uri: json.get_str_field("userinfo_uri")?,
            client: BasicClient::new(client_id)
                .set_client_secret(client_secret)
                .set_auth_uri(auth_url)
                .set_token_uri(token_url)
                .set_redirect_uri(redirect_url),
        })
    }

    pub(crate) fn client(&self) -> &OktaClient {
        &self.client
    }

    pub(crate) fn userinfo_uri(&self) -> &str {
        &self.userinfo_uri
    }
}
