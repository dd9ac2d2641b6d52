use base64::{Engine, prelude::BASE64_STANDARD};
use chrono::Utc;
use http::header::{ORIGIN, REFERER};
use reqwest::{Client, Url};
use rsa::{Pkcs1v15Encrypt, RsaPublicKey, pkcs8::DecodePublicKey};
use serde::{Deserialize, Serialize};

use crate::{api::sunsynk::response::Response, prelude::*};

const SOURCE: &str = "sunsynk";
const CLIENT_ID: &str = "csp-web";
const WEB_ORIGIN: &str = "https://www.sunsynk.net";

pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Log in with the password encrypted by the server's current public key.
#[instrument(skip_all, fields(username = %credentials.username))]
pub async fn login(client: &Client, auth_url: &Url, credentials: &Credentials) -> Result<String> {
    #[derive(Serialize)]
    struct Request<'a> {
        username: &'a str,
        password: &'a str,
        grant_type: &'static str,
        client_id: &'static str,
        source: &'static str,
    }

    #[derive(Deserialize)]
    struct Token {
        access_token: String,
    }

    let public_key = fetch_public_key(client, auth_url).await?;
    let password = encrypt_password(&public_key, &credentials.password)?;
    info!("logging in…");
    let path = "oauth/token/new";
    let response: Response<Token> = client
        .post(auth_url.join(path)?)
        .header(ORIGIN, WEB_ORIGIN)
        .header(REFERER, format!("{WEB_ORIGIN}/"))
        .json(&Request {
            username: &credentials.username,
            password: &password,
            grant_type: "password",
            client_id: CLIENT_ID,
            source: SOURCE,
        })
        .send()
        .await
        .with_context(|| format!("failed to call `{path}`"))?
        .error_for_status()
        .context("Sunsynk login failed, check the username and password")?
        .json()
        .await
        .with_context(|| format!("failed to deserialize `{path}` response JSON"))?;
    let token = Result::<Option<Token>>::from(response)?.context("Sunsynk returned no access token")?;
    Ok(token.access_token)
}

#[instrument(skip_all, level = Level::DEBUG)]
async fn fetch_public_key(client: &Client, auth_url: &Url) -> Result<String> {
    #[derive(Deserialize)]
    struct PublicKeyResponse {
        #[serde(default)]
        success: bool,

        data: Option<String>,
    }

    let nonce = Utc::now().timestamp_millis();
    let path = "anonymous/publicKey";
    let response: PublicKeyResponse = client
        .get(auth_url.join(path)?)
        .query(&[("nonce", nonce.to_string()), ("source", SOURCE.to_string()), ("sign", sign(nonce))])
        .send()
        .await
        .with_context(|| format!("failed to call `{path}`"))?
        .error_for_status()
        .with_context(|| format!("`{path}` failed"))?
        .json()
        .await
        .with_context(|| format!("failed to deserialize `{path}` response JSON"))?;
    ensure!(response.success, "Sunsynk refused to give out the public key");
    response.data.filter(|key| !key.is_empty()).context("Sunsynk returned no public key")
}

/// Signature of the public key request: the salt is baked into the Sunsynk web app.
fn sign(nonce: i64) -> String {
    let digest = md5::compute(format!("nonce={nonce}&source={SOURCE}POWER_VIEW").as_bytes());
    format!("{digest:x}")
}

/// Encrypt the password with PKCS #1 v1.5 and encode it in Base64.
///
/// The key may come bare or PEM-armored.
fn encrypt_password(public_key: &str, password: &str) -> Result<String> {
    let encoded: String = public_key
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .flat_map(str::chars)
        .filter(|char_| !char_.is_whitespace())
        .collect();
    let der = BASE64_STANDARD.decode(encoded).context("the public key is not valid Base64")?;
    let public_key =
        RsaPublicKey::from_public_key_der(&der).context("the public key is not an RSA key")?;
    let encrypted = public_key
        .encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, password.as_bytes())
        .context("failed to encrypt the password")?;
    Ok(BASE64_STANDARD.encode(encrypted))
}

#[cfg(test)]
pub mod tests {
    use mockito::{Matcher, ServerGuard};
    use rsa::{
        RsaPrivateKey,
        pkcs8::{EncodePublicKey, LineEnding},
    };
    use serde_json::json;

    use super::*;

    pub fn private_key() -> RsaPrivateKey {
        RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap()
    }

    pub fn bare_public_key(private_key: &RsaPrivateKey) -> String {
        let der = private_key.to_public_key().to_public_key_der().unwrap();
        BASE64_STANDARD.encode(der.as_bytes())
    }

    /// Mock both login endpoints, handing out `token`.
    pub async fn mock_login(
        server: &mut ServerGuard,
        public_key: &str,
        token: &str,
    ) -> (mockito::Mock, mockito::Mock) {
        let public_key_mock = server
            .mock("GET", "/anonymous/publicKey")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("source".into(), "sunsynk".into()),
                Matcher::Regex("nonce=[0-9]+".into()),
                Matcher::Regex("sign=[0-9a-f]{32}".into()),
            ]))
            .with_status(200)
            .with_body(json!({ "code": 0, "success": true, "data": public_key }).to_string())
            .create_async()
            .await;
        let token_mock = server
            .mock("POST", "/oauth/token/new")
            .match_header("origin", "https://www.sunsynk.net")
            .match_body(Matcher::PartialJson(json!({
                "username": "jane@example.com",
                "grant_type": "password",
                "client_id": "csp-web",
                "source": "sunsynk",
            })))
            .with_status(200)
            .with_body(
                json!({
                    "code": 0,
                    "msg": "Success",
                    "data": { "access_token": token, "token_type": "bearer" },
                    "success": true,
                })
                .to_string(),
            )
            .create_async()
            .await;
        (public_key_mock, token_mock)
    }

    pub fn credentials() -> Credentials {
        Credentials { username: "jane@example.com".to_string(), password: "hunter2".to_string() }
    }

    #[test]
    fn test_sign() {
        let expected = md5::compute(b"nonce=1700000000000&source=sunsynkPOWER_VIEW");
        assert_eq!(sign(1_700_000_000_000), format!("{expected:x}"));
        assert_eq!(sign(42).len(), 32);
    }

    #[test]
    fn test_encrypt_password_bare_key() -> Result {
        let private_key = private_key();
        let encrypted = encrypt_password(&bare_public_key(&private_key), "hunter2")?;
        let decrypted = private_key.decrypt(Pkcs1v15Encrypt, &BASE64_STANDARD.decode(encrypted)?)?;
        assert_eq!(decrypted, b"hunter2");
        Ok(())
    }

    #[test]
    fn test_encrypt_password_pem_key() -> Result {
        let private_key = private_key();
        let pem = private_key.to_public_key().to_public_key_pem(LineEnding::LF)?;
        let encrypted = encrypt_password(&pem, "hunter2")?;
        let decrypted = private_key.decrypt(Pkcs1v15Encrypt, &BASE64_STANDARD.decode(encrypted)?)?;
        assert_eq!(decrypted, b"hunter2");
        Ok(())
    }

    #[test]
    fn test_encrypt_password_garbage_key() {
        assert!(encrypt_password("not a key", "hunter2").is_err());
    }

    #[tokio::test]
    async fn test_login_ok() -> Result {
        let mut server = mockito::Server::new_async().await;
        let public_key = bare_public_key(&private_key());
        let (public_key_mock, token_mock) = mock_login(&mut server, &public_key, "abc123").await;
        let token = login(&Client::new(), &server.url().parse()?, &credentials()).await?;
        assert_eq!(token, "abc123");
        public_key_mock.assert_async().await;
        token_mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_login_public_key_refused() -> Result {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/anonymous/publicKey")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "success": false, "data": null }).to_string())
            .create_async()
            .await;
        assert!(login(&Client::new(), &server.url().parse()?, &credentials()).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_login_wrong_password() -> Result {
        let mut server = mockito::Server::new_async().await;
        let public_key = bare_public_key(&private_key());
        let _public_key_mock = server
            .mock("GET", "/anonymous/publicKey")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "success": true, "data": public_key }).to_string())
            .create_async()
            .await;
        let _token_mock =
            server.mock("POST", "/oauth/token/new").with_status(400).create_async().await;
        let error = login(&Client::new(), &server.url().parse()?, &credentials()).await.unwrap_err();
        assert!(format!("{error:#}").contains("username and password"), "{error:#}");
        Ok(())
    }
}
