use crate::error::ConfigError;

/// 目标地区（国家）
///
/// 既是搜索条件，也是账本中的一列。`ALL` 的顺序就是运行时遍历的顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Region {
    Argentina,
    Spain,
    Mexico,
    Colombia,
    Chile,
    Peru,
    Uruguay,
    Paraguay,
    Bolivia,
    Ecuador,
    Venezuela,
    CostaRica,
    Panama,
    Guatemala,
    ElSalvador,
    Honduras,
    Nicaragua,
    DominicanRepublic,
}

impl Region {
    /// 全部地区，按固定顺序
    pub const ALL: [Region; 18] = [
        Region::Argentina,
        Region::Spain,
        Region::Mexico,
        Region::Colombia,
        Region::Chile,
        Region::Peru,
        Region::Uruguay,
        Region::Paraguay,
        Region::Bolivia,
        Region::Ecuador,
        Region::Venezuela,
        Region::CostaRica,
        Region::Panama,
        Region::Guatemala,
        Region::ElSalvador,
        Region::Honduras,
        Region::Nicaragua,
        Region::DominicanRepublic,
    ];

    /// 搜索和账本中使用的标准名称
    pub fn name(self) -> &'static str {
        match self {
            Region::Argentina => "Argentina",
            Region::Spain => "Spain",
            Region::Mexico => "Mexico",
            Region::Colombia => "Colombia",
            Region::Chile => "Chile",
            Region::Peru => "Peru",
            Region::Uruguay => "Uruguay",
            Region::Paraguay => "Paraguay",
            Region::Bolivia => "Bolivia",
            Region::Ecuador => "Ecuador",
            Region::Venezuela => "Venezuela",
            Region::CostaRica => "Costa Rica",
            Region::Panama => "Panama",
            Region::Guatemala => "Guatemala",
            Region::ElSalvador => "El Salvador",
            Region::Honduras => "Honduras",
            Region::Nicaragua => "Nicaragua",
            Region::DominicanRepublic => "Dominican Republic",
        }
    }

    /// 从名称解析地区（忽略大小写、空格和连字符；同时接受西语名称）
    pub fn from_name(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        let region = match key.as_str() {
            "argentina" => Region::Argentina,
            "spain" | "españa" | "espana" => Region::Spain,
            "mexico" | "méxico" => Region::Mexico,
            "colombia" => Region::Colombia,
            "chile" => Region::Chile,
            "peru" | "perú" => Region::Peru,
            "uruguay" => Region::Uruguay,
            "paraguay" => Region::Paraguay,
            "bolivia" => Region::Bolivia,
            "ecuador" => Region::Ecuador,
            "venezuela" => Region::Venezuela,
            "costarica" => Region::CostaRica,
            "panama" | "panamá" => Region::Panama,
            "guatemala" => Region::Guatemala,
            "elsalvador" => Region::ElSalvador,
            "honduras" => Region::Honduras,
            "nicaragua" => Region::Nicaragua,
            "dominicanrepublic" | "repúblicadominicana" | "republicadominicana" => {
                Region::DominicanRepublic
            }
            _ => return None,
        };
        Some(region)
    }

    /// 解析地区列表，结果按 `ALL` 的顺序排列并去重
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Region>, ConfigError> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            let region = Region::from_name(name).ok_or_else(|| ConfigError::UnknownRegion {
                name: name.to_string(),
            })?;
            selected.push(region);
        }

        Ok(Region::ALL
            .iter()
            .copied()
            .filter(|r| selected.contains(r))
            .collect())
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_region_round_trips_through_its_name() {
        for region in Region::ALL {
            assert_eq!(Region::from_name(region.name()), Some(region));
        }
    }

    #[test]
    fn from_name_accepts_loose_spellings() {
        assert_eq!(Region::from_name("costa-rica"), Some(Region::CostaRica));
        assert_eq!(Region::from_name("  EL SALVADOR "), Some(Region::ElSalvador));
        assert_eq!(Region::from_name("España"), Some(Region::Spain));
        assert_eq!(Region::from_name("Atlantis"), None);
    }

    #[test]
    fn parse_list_keeps_canonical_order_and_dedups() {
        let regions = Region::parse_list(&["Chile", "Argentina", "chile", ""]).unwrap();
        assert_eq!(regions, vec![Region::Argentina, Region::Chile]);
    }

    #[test]
    fn parse_list_rejects_unknown_region() {
        let err = Region::parse_list(&["Chile", "Narnia"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRegion { name } if name == "Narnia"));
    }
}
