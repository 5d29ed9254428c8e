/// Every operation the reservations API serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    SignUp,
    SignIn,
    ListTables,
    CreateTable,
    GetTable { table_id: String },
    CreateReservation,
    ListReservations,
}

impl Route {
    /// Matches `method` case-insensitively; empty path segments are ignored.
    pub fn resolve(method: &str, path: &str) -> Option<Self> {
        let method = method.trim().to_ascii_uppercase();
        let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();

        match (method.as_str(), segments.as_slice()) {
            ("POST", ["signup"]) => Some(Self::SignUp),
            ("POST", ["signin"]) => Some(Self::SignIn),
            ("GET", ["tables"]) => Some(Self::ListTables),
            ("POST", ["tables"]) => Some(Self::CreateTable),
            ("GET", ["tables", table_id]) => Some(Self::GetTable {
                table_id: (*table_id).to_string(),
            }),
            ("POST", ["reservations"]) => Some(Self::CreateReservation),
            ("GET", ["reservations"]) => Some(Self::ListReservations),
            _ => None,
        }
    }

    pub fn requires_identity(&self) -> bool {
        !matches!(self, Self::SignUp | Self::SignIn)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SignUp => "sign_up",
            Self::SignIn => "sign_in",
            Self::ListTables => "list_tables",
            Self::CreateTable => "create_table",
            Self::GetTable { .. } => "get_table",
            Self::CreateReservation => "create_reservation",
            Self::ListReservations => "list_reservations",
        }
    }
}
