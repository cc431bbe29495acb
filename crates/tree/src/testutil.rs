use crate::record::TreeRecord;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rec {
    pub id: String,
    pub path: String,
    pub size: u64,
}

impl TreeRecord for Rec {
    fn id(&self) -> &str {
        &self.id
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn size(&self) -> u64 {
        self.size
    }
}

pub(crate) fn rec(path: &str, size: u64) -> Rec {
    Rec {
        id: format!("file:{path}"),
        path: path.into(),
        size,
    }
}
