//! Transactional email over SMTP.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use secrecy::ExposeSecret;

use crate::{
    config::SmtpConfig,
    error::{AppError, AppResult},
    models::{Order, OrderItem},
};

#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    /// Payment receipt, sent after a payment verifies.
    pub async fn send_receipt(
        &self,
        to: &str,
        order: &Order,
        items: &[OrderItem],
    ) -> AppResult<()> {
        let subject = format!("Receipt for order {}", order.invoice_number);
        let text = receipt_text(order, items);
        let html = receipt_html(order, items);
        self.send_multipart(to, &subject, &text, &html).await
    }

    pub async fn send_seller_decision(
        &self,
        to: &str,
        shop_name: &str,
        approved: bool,
    ) -> AppResult<()> {
        let (subject, body) = if approved {
            (
                format!("Your shop \"{shop_name}\" is approved"),
                format!(
                    "Congratulations! Your seller application for \"{shop_name}\" was approved.\n\
                     You can now sign in and start listing products."
                ),
            )
        } else {
            (
                "Update on your seller application".to_string(),
                format!(
                    "Unfortunately your seller application for \"{shop_name}\" was not approved \
                     this time. You are welcome to apply again."
                ),
            )
        };
        let html = format!("<p>{}</p>", body.replace('\n', "<br>"));
        self.send_multipart(to, &subject, &body, &html).await
    }

    async fn send_multipart(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> AppResult<()> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| AppError::BadRequest("invalid sender address".into()))?,
            )
            .to(to
                .parse()
                .map_err(|_| AppError::BadRequest("invalid recipient address".into()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

        tracing::info!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

fn money(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, amount % 100)
}

fn receipt_text(order: &Order, items: &[OrderItem]) -> String {
    let mut out = format!(
        "Thank you for your order.\n\nInvoice: {}\nStatus: {}\n\nItems:\n",
        order.invoice_number, order.status
    );
    for item in items {
        out.push_str(&format!(
            "  {} x product {} @ {}\n",
            item.quantity,
            item.product_id,
            money(item.unit_price)
        ));
    }
    if order.discount_amount > 0 {
        out.push_str(&format!("\nDiscount: -{}", money(order.discount_amount)));
    }
    out.push_str(&format!("\nTotal paid: {}\n", money(order.total_amount)));
    out
}

fn receipt_html(order: &Order, items: &[OrderItem]) -> String {
    let mut rows = String::new();
    for item in items {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            item.product_id,
            item.quantity,
            money(item.unit_price)
        ));
    }
    format!(
        "<h2>Receipt</h2><p>Invoice <strong>{}</strong></p>\
         <table><tr><th>Product</th><th>Qty</th><th>Unit price</th></tr>{rows}</table>\
         <p>Discount: -{}</p><p><strong>Total: {}</strong></p>",
        order.invoice_number,
        money(order.discount_amount),
        money(order.total_amount)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn order() -> Order {
        Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            total_amount: 123_45,
            discount_amount: 500,
            coupon_id: None,
            status: "paid".into(),
            payment_status: "paid".into(),
            invoice_number: "INV-20250101-abcd1234".into(),
            shipping_address: "12 Example Lane".into(),
            paid_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn receipt_mentions_invoice_and_total() {
        let text = receipt_text(&order(), &[]);
        assert!(text.contains("INV-20250101-abcd1234"));
        assert!(text.contains("123.45"));
        assert!(text.contains("Discount: -5.00"));
    }

    #[test]
    fn money_pads_minor_units() {
        assert_eq!(money(5), "0.05");
        assert_eq!(money(100), "1.00");
        assert_eq!(money(123_45), "123.45");
    }
}
