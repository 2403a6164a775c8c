use crate::model::id::SpotNumber;
use derive_new::new;

#[derive(new, Debug)]
pub struct UpdateOccupancy {
    pub spot: SpotNumber,
    pub occupied: bool,
}
