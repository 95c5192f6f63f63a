use crate::{
    calendar::OperatingWindow,
    db::{DbPool, OrmConn},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub window: OperatingWindow,
}
