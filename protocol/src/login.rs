//! Login message sent once per successful TCP connect.

/// Identity fields presented to the server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginInfo {
    pub version: String,
    pub email_address: String,
    pub dyn_password: String,
    pub callsign_and_user: String,
    pub client_type: String,
    pub band_and_channel: String,
    pub description: String,
    pub country: String,
    pub city_city_part: String,
    pub net: String,
}

impl LoginInfo {
    /// Tagged segments in the order the server expects them.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &str); 10] {
        [
            ("VX", &self.version),
            ("EA", &self.email_address),
            ("PW", &self.dyn_password),
            ("ON", &self.callsign_and_user),
            ("CL", &self.client_type),
            ("BC", &self.band_and_channel),
            ("DS", &self.description),
            ("NN", &self.country),
            ("CT", &self.city_city_part),
            ("NT", &self.net),
        ]
    }

    /// Encode the login message.
    ///
    /// Format: `CT:<VX>..</VX><EA>..</EA>...<NT>..</NT>\n`
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut msg = String::from("CT:");
        for (tag, value) in self.fields() {
            msg.push('<');
            msg.push_str(tag);
            msg.push('>');
            msg.push_str(value);
            msg.push_str("</");
            msg.push_str(tag);
            msg.push('>');
        }
        msg.push('\n');
        msg.into_bytes()
    }
}
