use super::OutgoingEmail;

pub fn verification_link(backend_url: &str, token: &str) -> String {
    format!("{backend_url}/api/auth/verify-email?token={token}")
}

pub fn reset_link(frontend_url: &str, token: &str) -> String {
    format!("{frontend_url}/reset-password/{token}")
}

pub fn verification_email(to: &str, link: &str, resend: bool) -> OutgoingEmail {
    let heading = if resend {
        "New Verification Request"
    } else {
        "Welcome to Blogger"
    };
    OutgoingEmail {
        to: to.to_string(),
        subject: "Verify Your Email".to_string(),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px;">
  <h2>{heading}</h2>
  <p>Click below to verify your email:</p>
  <a href="{link}" style="display: inline-block; padding: 12px 24px; background: #2563eb; color: white; text-decoration: none; border-radius: 4px;">Verify Email</a>
  <p style="margin-top: 20px; color: #666;">This link expires in 24 hours.</p>
</div>"#
        ),
    }
}

pub fn reset_email(to: &str, link: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Password Reset".to_string(),
        html: format!(
            r#"<p>Click the link to reset your password:</p>
<a href="{link}">{link}</a>
<p style="color: #666;">This link expires in 1 hour. If you did not request a reset, ignore this email.</p>"#
        ),
    }
}
